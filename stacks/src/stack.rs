use crate::template::Template;

/// A deployable unit: one CloudFormation stack
///
/// Building the template is a pure function of the stack's inputs,
/// nothing is read from the environment or the clock.
pub trait Stack {
    /// CloudFormation stack name
    fn name(&self) -> String;

    fn template(&self) -> eyre::Result<Template>;
}
