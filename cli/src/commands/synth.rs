mod runner;
use crate::commands::ProjectArgs;
use crate::project::StackKind;
use crate::runner::{Runnable, Runner};
use runner::SynthRunner;
use std::path::PathBuf;

#[derive(clap::Args, Clone)]
pub(crate) struct SynthCommand {
    /// Stacks to synthesize
    #[arg(value_enum, default_value_t = StackKind::All)]
    stack: StackKind,

    /// Directory for the templates
    #[arg(short, long, value_name = "DIR", default_value = "fepu08.out")]
    out: PathBuf,

    #[command(flatten)]
    project: ProjectArgs,
}

impl Runnable for SynthCommand {
    fn runner(&self) -> impl Runner {
        SynthRunner {
            command: self.clone(),
        }
    }
}
