pub mod deploy;
pub mod destroy;
pub mod status;
pub mod synth;

use crate::context::{parse_pair, Context};
use crate::project::Project;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write CloudFormation templates to disk, without deployment
    Synth(synth::SynthCommand),

    /// Create or update stacks in CloudFormation
    Deploy(deploy::DeployCommand),

    /// [DANGER] Delete stacks together with their buckets
    Destroy(destroy::DestroyCommand),

    /// Show the status of deployed stacks
    Status(status::StatusCommand),
}

/// Where the stacks' inputs come from
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct ProjectArgs {
    /// Context values, e.g. --context env=staging
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_pair)]
    context: Vec<(String, String)>,

    /// Config file, defaults to fepu08.toml in the current directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl ProjectArgs {
    pub(crate) fn load(&self) -> eyre::Result<Project> {
        Project::load(self.config.as_deref(), &Context::new(&self.context))
    }
}
