use crate::environment::DeployEnvironment;

/// Organization prefix of globally unique resource names
pub const DEFAULT_ORG_PREFIX: &str = "fepu08";

/// Derives resource names from the deploy environment
///
/// Uniqueness relies on the environment identifier alone: two stacks
/// declared for the same environment collide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Naming {
    org_prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Naming::new(DEFAULT_ORG_PREFIX)
    }
}

impl Naming {
    pub fn new(org_prefix: &str) -> Self {
        Naming {
            org_prefix: org_prefix.to_string(),
        }
    }

    pub fn infrastructure_bucket(&self, env: &DeployEnvironment) -> String {
        format!("{}-{env}-infrastructure-bucket", self.org_prefix)
    }

    pub fn artifact_bucket(&self, env: &DeployEnvironment) -> String {
        format!("{}-{env}-aws-codepipeline-artifact-bucket", self.org_prefix)
    }

    pub fn pipeline(&self, env: &DeployEnvironment) -> String {
        format!("{env}-CI-Pipeline")
    }

    /// CloudFormation stack holding the infrastructure bucket
    pub fn storage_stack(&self, env: &DeployEnvironment) -> String {
        format!("{env}-InfrastructureStack")
    }

    /// CloudFormation stack holding the CI pipeline
    pub fn pipeline_stack(&self, env: &DeployEnvironment) -> String {
        format!("{env}-PipelineStack")
    }
}
