use crate::error::Error;
use eyre::WrapErr;
use fepu08_stacks::naming::{Naming, DEFAULT_ORG_PREFIX};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const CONFIG_FILE: &str = "fepu08.toml";

/// Structure of fepu08.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Config {
    /// org_prefix = "fepu08"
    #[serde(default)]
    org_prefix: Option<String>,

    /// [environment]
    /// name = "dev"
    #[serde(default)]
    pub(crate) environment: EnvironmentSection,

    /// [pipeline]
    /// repository_owner = "fepu08"
    /// repository_name = "infrastructure"
    /// branch = "main"
    #[serde(default)]
    pub(crate) pipeline: PipelineSection,

    /// [deploy]
    /// role_arn = "arn:aws:iam::123456789012:role/cdk-hnb659fds-deploy-role"
    /// execution_role_arn = "arn:aws:iam::123456789012:role/cdk-hnb659fds-cfn-exec-role"
    /// bootstrap_qualifier = "hnb659fds"
    /// region = "eu-west-1"
    #[serde(default)]
    pub(crate) deploy: DeploySettings,

    #[serde(skip)]
    pub(crate) path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EnvironmentSection {
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PipelineSection {
    pub(crate) repository_owner: Option<String>,
    pub(crate) repository_name: Option<String>,
    pub(crate) branch: Option<String>,
}

/// How the CloudFormation client authenticates
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeploySettings {
    /// Role assumed before calling CloudFormation, the bootstrap deploy role when unset
    pub(crate) role_arn: Option<String>,

    /// Role CloudFormation itself uses to create the resources
    pub(crate) execution_role_arn: Option<String>,

    /// Qualifier of the bootstrap roles, hnb659fds when unset
    pub(crate) bootstrap_qualifier: Option<String>,

    pub(crate) region: Option<String>,
}

impl Config {
    /// Read the config from an explicit file, or fepu08.toml in the directory
    ///
    /// An explicitly passed file must exist, a missing fepu08.toml falls back to defaults.
    pub(crate) fn load(explicit: Option<&Path>, dir: &Path) -> eyre::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => dir.join(CONFIG_FILE),
        };

        let toml_string = match fs::read_to_string(&path) {
            Ok(toml_string) => toml_string,
            Err(_) if explicit.is_none() => {
                log::info!("No {CONFIG_FILE} found in {dir:?}, using defaults");

                return Ok(Self {
                    path,
                    ..Default::default()
                });
            }
            Err(e) => {
                log::error!("Failed to read {path:?}: {e:?}");

                return Err(Error::new(
                    &format!("Failed to read {}", path.to_string_lossy()),
                    Some("Check the path passed with --config."),
                )
                .into());
            }
        };

        let mut config: Config = toml::from_str(&toml_string).wrap_err(Error::new(
            &format!("Failed to parse {}", path.to_string_lossy()),
            Some("Check the file to be valid TOML."),
        ))?;

        config.path = path;
        Ok(config)
    }

    pub(crate) fn naming(&self) -> Naming {
        Naming::new(self.org_prefix.as_deref().unwrap_or(DEFAULT_ORG_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudformation::{deploy_roles, BootstrapRoles, DEFAULT_BOOTSTRAP_QUALIFIER};

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();

        assert!(config.environment.name.is_none());
        assert!(config.deploy.role_arn.is_none());
        assert_eq!(config.naming(), Naming::default());
        assert_eq!(config.path, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("other.toml");

        assert!(Config::load(Some(missing.as_path()), dir.path()).is_err());
    }

    #[test]
    fn test_full_file() {
        let dir = tempfile::tempdir().unwrap();

        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
            org_prefix = "acme"

            [environment]
            name = "dev"

            [pipeline]
            repository_owner = "acme"
            repository_name = "infrastructure"
            branch = "main"

            [deploy]
            role_arn = "arn:aws:iam::123456789012:role/cdk-deploy"
            execution_role_arn = "arn:aws:iam::123456789012:role/cdk-cfn-exec"
            region = "eu-west-1"
            "#,
        )
        .unwrap();

        let config = Config::load(None, dir.path()).unwrap();

        assert_eq!(config.naming(), Naming::new("acme"));
        assert_eq!(config.environment.name.as_deref(), Some("dev"));
        assert_eq!(config.pipeline.repository_name.as_deref(), Some("infrastructure"));
        assert_eq!(config.deploy.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            config.deploy.execution_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/cdk-cfn-exec")
        );
    }

    #[test]
    fn test_shipped_config_deploys_through_bootstrap_roles() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../infrastructure");
        let config = Config::load(None, &dir).unwrap();

        assert_eq!(config.naming(), Naming::default());
        assert_eq!(config.environment.name.as_deref(), Some("dev"));
        assert!(config.deploy.role_arn.is_none());

        let roles = BootstrapRoles::new(DEFAULT_BOOTSTRAP_QUALIFIER, "123456789012", "eu-west-1");
        let (role_arn, execution_role_arn) =
            deploy_roles(&config.deploy, Some(roles.clone())).unwrap();

        assert_eq!(role_arn, roles.deploy);
        assert_eq!(execution_role_arn, Some(roles.execution));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[environment\nname = 1").unwrap();

        assert!(Config::load(None, dir.path()).is_err());
    }
}
