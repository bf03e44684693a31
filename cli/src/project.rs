use crate::config::{Config, DeploySettings, PipelineSection};
use crate::context::Context;
use crate::error::Error;
use fepu08_stacks::environment::DEPLOY_ENVIRONMENT;
use fepu08_stacks::{DeployEnvironment, Naming, PipelineProps, PipelineStack, Stack, StorageStack};
use std::path::Path;

/// Which stacks a command works on
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StackKind {
    Storage,
    Pipeline,
    All,
}

/// Everything needed to declare the stacks of one environment
#[derive(Clone, Debug)]
pub(crate) struct Project {
    pub(crate) environment: DeployEnvironment,
    pub(crate) naming: Naming,
    pub(crate) pipeline: PipelineSection,
    pub(crate) deploy: DeploySettings,
}

/// Context value first, then the process variable, then fepu08.toml
fn resolve_environment(
    context: Option<&str>,
    process: Option<&str>,
    file: Option<&str>,
) -> Option<String> {
    context.or(process).or(file).map(str::to_string)
}

impl Project {
    pub(crate) fn load(config: Option<&Path>, context: &Context) -> eyre::Result<Self> {
        let dir = std::env::current_dir()?;
        let config = Config::load(config, &dir)?;
        log::info!("Using config {:?}", config.path);
        let process = std::env::var(DEPLOY_ENVIRONMENT).ok();
        Self::from_config(config, context, process.as_deref())
    }

    fn from_config(config: Config, context: &Context, process: Option<&str>) -> eyre::Result<Self> {
        let environment = resolve_environment(
            context.environment(),
            process,
            config.environment.name.as_deref(),
        )
        .ok_or_else(|| {
            Error::new(
                "Deploy environment is not set",
                Some("Pass --context env=<name>, set DEPLOY_ENVIRONMENT, or add [environment] name to fepu08.toml."),
            )
        })?;

        log::info!("{environment} environment detected");

        Ok(Project {
            environment: DeployEnvironment::from(environment),
            naming: config.naming(),
            pipeline: config.pipeline,
            deploy: config.deploy,
        })
    }

    pub(crate) fn storage_stack(&self) -> StorageStack {
        StorageStack::new(&self.environment, &self.naming)
    }

    pub(crate) fn pipeline_stack(&self) -> eyre::Result<PipelineStack> {
        let missing = |field: &str| {
            Error::new(
                &format!("Missing pipeline {field}"),
                Some(&format!("Add {field} to the [pipeline] section of fepu08.toml.")),
            )
        };

        let section = &self.pipeline;

        Ok(PipelineStack::new(PipelineProps {
            environment: self.environment.clone(),
            repository_owner: section
                .repository_owner
                .clone()
                .ok_or_else(|| missing("repository_owner"))?,
            repository_name: section
                .repository_name
                .clone()
                .ok_or_else(|| missing("repository_name"))?,
            branch: section.branch.clone().ok_or_else(|| missing("branch"))?,
            naming: self.naming.clone(),
        }))
    }

    /// Stacks in deployment order
    pub(crate) fn stacks(&self, kind: StackKind) -> eyre::Result<Vec<Box<dyn Stack>>> {
        let mut stacks: Vec<Box<dyn Stack>> = vec![];

        if matches!(kind, StackKind::Storage | StackKind::All) {
            stacks.push(Box::new(self.storage_stack()));
        }

        if matches!(kind, StackKind::Pipeline | StackKind::All) {
            stacks.push(Box::new(self.pipeline_stack()?));
        }

        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_environment_precedence() {
        assert_eq!(
            resolve_environment(Some("ctx"), Some("proc"), Some("file")).as_deref(),
            Some("ctx")
        );
        assert_eq!(
            resolve_environment(None, Some("proc"), Some("file")).as_deref(),
            Some("proc")
        );
        assert_eq!(
            resolve_environment(None, None, Some("file")).as_deref(),
            Some("file")
        );
        assert_eq!(resolve_environment(None, None, None), None);
    }

    #[test]
    fn test_missing_environment_is_an_error() {
        let result = Project::from_config(Config::default(), &Context::default(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_context_overrides_file() {
        let context = Context::new(&[("env".into(), "staging".into())]);
        let project = Project::from_config(
            config("[environment]\nname = \"dev\""),
            &context,
            None,
        )
        .unwrap();

        assert_eq!(project.environment.as_str(), "staging");
        assert_eq!(project.storage_stack().name(), "staging-InfrastructureStack");
    }

    #[test]
    fn test_pipeline_requires_repository_fields() {
        let project = Project::from_config(
            config("[pipeline]\nrepository_owner = \"fepu08\"\nbranch = \"main\""),
            &Context::default(),
            Some("dev"),
        )
        .unwrap();

        let error = project.pipeline_stack().unwrap_err();
        assert!(error.to_string().contains("repository_name"));
    }

    #[test]
    fn test_all_stacks_in_deployment_order() {
        let project = Project::from_config(
            config(
                "[pipeline]\nrepository_owner = \"fepu08\"\nrepository_name = \"infra\"\nbranch = \"main\"",
            ),
            &Context::default(),
            Some("dev"),
        )
        .unwrap();

        let names: Vec<String> = project
            .stacks(StackKind::All)
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();

        assert_eq!(names, vec!["dev-InfrastructureStack", "dev-PipelineStack"]);
    }
}
