mod runner;
use crate::commands::ProjectArgs;
use crate::project::StackKind;
use crate::runner::{Runnable, Runner};
use runner::DestroyRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct DestroyCommand {
    /// Stacks to destroy, "all" destroys the pipeline first
    #[arg(value_enum)]
    stack: StackKind,

    #[command(flatten)]
    project: ProjectArgs,
}

impl Runnable for DestroyCommand {
    fn runner(&self) -> impl Runner {
        DestroyRunner {
            command: self.clone(),
        }
    }
}
