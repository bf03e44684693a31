/// Name of the build variable carrying the deploy environment
pub const DEPLOY_ENVIRONMENT: &str = "DEPLOY_ENVIRONMENT";

/// Context key read by `fepu08 deploy --context <key>=<value>`
pub const CONTEXT_KEY: &str = "env";

/// Deploy environment identifier, e.g. "dev" or "prod"
///
/// Not validated: whatever is supplied ends up in resource names verbatim,
/// and a bad value is rejected by CloudFormation at apply time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeployEnvironment(String);

impl DeployEnvironment {
    pub fn new(name: &str) -> Self {
        DeployEnvironment(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeployEnvironment {
    fn from(name: &str) -> Self {
        DeployEnvironment::new(name)
    }
}

impl From<String> for DeployEnvironment {
    fn from(name: String) -> Self {
        DeployEnvironment(name)
    }
}

/// Options passed into the build stage
///
/// `DEPLOY_ENVIRONMENT` is the only recognized option. It is injected into the
/// build container and forwarded to the deploy command as a context parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub deploy_environment: DeployEnvironment,
}

impl BuildEnvironment {
    pub fn new(deploy_environment: &DeployEnvironment) -> Self {
        BuildEnvironment {
            deploy_environment: deploy_environment.clone(),
        }
    }

    /// Plain-text variables of the build container
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        vec![(DEPLOY_ENVIRONMENT, self.deploy_environment.to_string())]
    }

    /// `env=<identifier>`
    pub fn context_parameter(&self) -> String {
        format!("{CONTEXT_KEY}={}", self.deploy_environment)
    }
}
