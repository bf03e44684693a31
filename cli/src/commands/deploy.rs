mod runner;
use crate::commands::ProjectArgs;
use crate::project::StackKind;
use crate::runner::{Runnable, Runner};
use runner::DeployRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct DeployCommand {
    /// Stacks to deploy, "all" deploys storage first
    #[arg(value_enum)]
    stack: StackKind,

    #[command(flatten)]
    project: ProjectArgs,
}

impl Runnable for DeployCommand {
    fn runner(&self) -> impl Runner {
        DeployRunner {
            command: self.clone(),
        }
    }
}
