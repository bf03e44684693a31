use crate::environment::BuildEnvironment;
use eyre::WrapErr;
use serde::Serialize;

pub const BUILD_IMAGE: &str = "aws/codebuild/amazonlinux2-x86_64-standard:5.0";
pub const COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";
pub const CONTAINER_TYPE: &str = "LINUX_CONTAINER";

/// Binary installed in the build container to run the deployment
pub const DEPLOY_CLI: &str = "fepu08";

/// Crate of the pulled repository providing the deploy CLI
pub const DEPLOY_CLI_PATH: &str = "cli";

/// Directory of the pulled repository holding `fepu08.toml`
pub const INFRASTRUCTURE_DIR: &str = "infrastructure";

/// CodeBuild build specification
///
/// https://docs.aws.amazon.com/codebuild/latest/userguide/build-spec-ref.html
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildSpec {
    pub version: &'static str,
    pub phases: Phases,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Phases {
    pub install: Phase,
    pub build: Phase,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Phase {
    pub commands: Vec<String>,
}

impl Phase {
    fn new(commands: &[&str]) -> Self {
        Phase {
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl BuildSpec {
    /// The fixed deploy script, only the environment identifier varies
    pub fn deploy(build: &BuildEnvironment) -> Self {
        // All commands of a buildspec 0.2 run in the same shell,
        // so the cargo env sourced in install stays visible in build.
        let install = Phase::new(&[
            "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y --profile minimal",
            ". \"$HOME/.cargo/env\"",
            &format!("cargo install --path {DEPLOY_CLI_PATH}"),
            &format!("cd {INFRASTRUCTURE_DIR}"),
            "cargo fetch",
        ]);

        let build = Phase::new(&[&format!(
            "{DEPLOY_CLI} deploy storage --context {}",
            build.context_parameter()
        )]);

        BuildSpec {
            version: "0.2",
            phases: Phases { install, build },
        }
    }

    /// CodeBuild accepts an inline build spec as a string
    pub fn to_json(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self).wrap_err("Failed to serialize build spec")
    }
}
