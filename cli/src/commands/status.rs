mod runner;
use crate::commands::ProjectArgs;
use crate::project::StackKind;
use crate::runner::{Runnable, Runner};
use runner::StatusRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct StatusCommand {
    /// Stacks to inspect
    #[arg(value_enum, default_value_t = StackKind::All)]
    stack: StackKind,

    #[command(flatten)]
    project: ProjectArgs,
}

impl Runnable for StatusCommand {
    fn runner(&self) -> impl Runner {
        StatusRunner {
            command: self.clone(),
        }
    }
}
