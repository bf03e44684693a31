use crate::bucket::{Bucket, RemovalPolicy};
use crate::environment::DeployEnvironment;
use crate::naming::Naming;
use crate::stack::Stack;
use crate::template::{reference, Template};

pub const INFRASTRUCTURE_BUCKET: &str = "InfrastructureBucket";

/// Declares the infrastructure bucket of a deploy environment
#[derive(Clone, Debug, PartialEq)]
pub struct StorageStack {
    environment: DeployEnvironment,
    naming: Naming,
}

impl StorageStack {
    pub fn new(environment: &DeployEnvironment, naming: &Naming) -> Self {
        StorageStack {
            environment: environment.clone(),
            naming: naming.clone(),
        }
    }

    pub fn bucket(&self) -> Bucket {
        Bucket::new(
            INFRASTRUCTURE_BUCKET,
            &self.naming.infrastructure_bucket(&self.environment),
        )
        .with_removal_policy(RemovalPolicy::Destroy)
    }
}

impl Stack for StorageStack {
    fn name(&self) -> String {
        self.naming.storage_stack(&self.environment)
    }

    fn template(&self) -> eyre::Result<Template> {
        log::info!(
            "{} environment detected. Declaring S3 bucket.",
            self.environment
        );

        let bucket = self.bucket();
        let mut template = Template::new(&format!(
            "Infrastructure bucket of the {} environment",
            self.environment
        ));

        template.add_resources(bucket.resources()?);
        template.add_output(
            "InfrastructureBucketName",
            reference(bucket.logical_id()),
            "Name of the infrastructure bucket",
        );

        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stack(env: &str) -> StorageStack {
        StorageStack::new(&DeployEnvironment::new(env), &Naming::default())
    }

    #[test]
    fn test_declares_exactly_one_bucket() {
        let template = stack("staging").template().unwrap();

        assert_eq!(template.resources().len(), 1);

        let bucket = template.resource(INFRASTRUCTURE_BUCKET).unwrap();
        assert_eq!(bucket["Type"], "AWS::S3::Bucket");
        assert_eq!(
            bucket["Properties"]["BucketName"],
            "fepu08-staging-infrastructure-bucket"
        );
        assert_eq!(bucket["DeletionPolicy"], "Delete");
        assert_eq!(bucket["UpdateReplacePolicy"], "Delete");
    }

    #[test]
    fn test_bucket_name_follows_environment() {
        for env in ["dev", "prod", "feature-42", ""] {
            let template = stack(env).template().unwrap();

            assert_eq!(
                template.resource(INFRASTRUCTURE_BUCKET).unwrap()["Properties"]["BucketName"],
                json!(format!("fepu08-{env}-infrastructure-bucket"))
            );
        }
    }

    #[test]
    fn test_stack_name() {
        assert_eq!(stack("dev").name(), "dev-InfrastructureStack");
    }

    #[test]
    fn test_output_references_bucket() {
        let template = stack("dev").template().unwrap();

        assert_eq!(
            template.outputs()["InfrastructureBucketName"]["Value"],
            json!({"Ref": "InfrastructureBucket"})
        );
    }

    #[test]
    fn test_declaration_is_idempotent() {
        assert_eq!(
            stack("dev").template().unwrap().to_json().unwrap(),
            stack("dev").template().unwrap().to_json().unwrap()
        );
    }
}
