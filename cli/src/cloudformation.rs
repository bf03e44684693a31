use crate::config::DeploySettings;
use crate::error::Error;
use crate::logger::Logger;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudformation::error::SdkError;
use aws_sdk_cloudformation::types::{Capability, StackEvent};
use eyre::WrapErr;
use fepu08_stacks::Template;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// Qualifier of the roles created by `cdk bootstrap` with default settings
pub(crate) const DEFAULT_BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

/// Roles of a bootstrapped account and region
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BootstrapRoles {
    pub(crate) deploy: String,
    pub(crate) execution: String,
}

impl BootstrapRoles {
    pub(crate) fn new(qualifier: &str, account: &str, region: &str) -> Self {
        BootstrapRoles {
            deploy: format!(
                "arn:aws:iam::{account}:role/cdk-{qualifier}-deploy-role-{account}-{region}"
            ),
            execution: format!(
                "arn:aws:iam::{account}:role/cdk-{qualifier}-cfn-exec-role-{account}-{region}"
            ),
        }
    }
}

/// Role to assume and execution role to pass to CloudFormation
///
/// Explicit settings win, bootstrap roles fill in whatever is not configured.
pub(crate) fn deploy_roles(
    settings: &DeploySettings,
    bootstrap: Option<BootstrapRoles>,
) -> eyre::Result<(String, Option<String>)> {
    match (&settings.role_arn, bootstrap) {
        (Some(role_arn), _) => Ok((role_arn.clone(), settings.execution_role_arn.clone())),
        (None, Some(roles)) => Ok((
            roles.deploy,
            settings.execution_role_arn.clone().or(Some(roles.execution)),
        )),
        (None, None) => Err(eyre::eyre!("No deploy role configured or derived")),
    }
}

/// DescribeStacks answers a ValidationError for a stack that does not exist
pub(crate) fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}

/// UpdateStack refuses a template identical to the deployed one
pub(crate) fn is_unchanged(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError")
        && message.is_some_and(|m| m.contains("No updates are to be performed"))
}

/// A stack deleted before recreation must be gone, anything else stops the deploy
pub(crate) fn ensure_deleted(name: &str, status: &StackStatus) -> eyre::Result<()> {
    match status {
        StackStatus::Deleted => Ok(()),
        status => Err(eyre::eyre!("Stack {name} could not be deleted before recreation ({status})")),
    }
}

/// Status of a stack, reduced to what a deploy needs to know
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StackStatus {
    InProgress(String),
    Complete(String),
    Failed(String),
    Deleted,
}

impl StackStatus {
    /// https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/view-stack-events.html#cfn-console-view-stack-data-resources-status-codes
    pub(crate) fn from_status(status: &str) -> Self {
        match status {
            "DELETE_COMPLETE" => StackStatus::Deleted,
            "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "IMPORT_COMPLETE" => {
                StackStatus::Complete(status.into())
            }
            s if s.ends_with("_IN_PROGRESS") => StackStatus::InProgress(status.into()),

            // Rollbacks complete, but the requested change did not happen
            _ => StackStatus::Failed(status.into()),
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        !matches!(self, StackStatus::InProgress(_))
    }

    /// A failed creation leaves a stack that can only be deleted
    pub(crate) fn requires_recreate(&self) -> bool {
        matches!(self, StackStatus::Failed(s) if s == "ROLLBACK_COMPLETE")
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackStatus::InProgress(s) | StackStatus::Complete(s) | StackStatus::Failed(s) => {
                write!(f, "{s}")
            }
            StackStatus::Deleted => write!(f, "DELETE_COMPLETE"),
        }
    }
}

/// What provisioning did to the stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Provision {
    Created,
    Updated,
    Unchanged,
}

/// A stack event, detached from the SDK types
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Event {
    pub(crate) logical_id: String,
    pub(crate) resource_type: String,
    pub(crate) status: String,
    pub(crate) reason: Option<String>,
}

impl From<&StackEvent> for Event {
    fn from(event: &StackEvent) -> Self {
        Event {
            logical_id: event.logical_resource_id().unwrap_or_default().to_string(),
            resource_type: event.resource_type().unwrap_or_default().to_string(),
            status: event
                .resource_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            reason: event.resource_status_reason().map(str::to_string),
        }
    }
}

impl Event {
    fn is_operation_start(&self) -> bool {
        self.resource_type == STACK_RESOURCE_TYPE
            && self.reason.as_deref() == Some("User Initiated")
    }
}

/// Failed resource events of the latest stack operation
///
/// Events come newest first, everything older than the
/// "User Initiated" stack event belongs to earlier operations.
pub(crate) fn latest_failures(events: &[Event]) -> Vec<Event> {
    events
        .iter()
        .take_while(|e| !e.is_operation_start())
        .filter(|e| e.status.ends_with("FAILED") && e.resource_type != STACK_RESOURCE_TYPE)
        .cloned()
        .collect()
}

pub(crate) struct Client {
    client: aws_sdk_cloudformation::Client,

    /// Passed to CloudFormation as RoleARN
    execution_role_arn: Option<String>,
}

impl Client {
    pub(crate) async fn new(settings: &DeploySettings) -> eyre::Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let config = loader.load().await;

        let bootstrap = match settings.role_arn {
            Some(_) => None,
            None => Some(Self::bootstrap_roles(&config, settings).await?),
        };

        let (role_arn, execution_role_arn) = deploy_roles(settings, bootstrap)?;
        log::info!("Assuming {role_arn}");

        let provider = AssumeRoleProvider::builder(role_arn)
            .session_name("fepu08-deploy")
            .configure(&config)
            .build()
            .await;

        let builder =
            aws_sdk_cloudformation::config::Builder::from(&config).credentials_provider(provider);

        Ok(Client {
            client: aws_sdk_cloudformation::Client::from_conf(builder.build()),
            execution_role_arn,
        })
    }

    /// Bootstrap roles of the caller's account in the configured region
    async fn bootstrap_roles(
        config: &SdkConfig,
        settings: &DeploySettings,
    ) -> eyre::Result<BootstrapRoles> {
        let region = config.region().ok_or_else(|| {
            Error::new(
                "AWS region is not set",
                Some("Set AWS_REGION or region in the [deploy] section of fepu08.toml."),
            )
        })?;

        let identity = aws_sdk_sts::Client::new(config)
            .get_caller_identity()
            .send()
            .await
            .wrap_err("Failed to get caller identity")?;

        let account_id = identity
            .account()
            .ok_or_else(|| eyre::Error::msg("Failed to get AWS account ID"))?;

        let qualifier = settings
            .bootstrap_qualifier
            .as_deref()
            .unwrap_or(DEFAULT_BOOTSTRAP_QUALIFIER);

        log::debug!("Deriving bootstrap roles for {account_id} in {region}");
        Ok(BootstrapRoles::new(qualifier, account_id, region.as_ref()))
    }

    /// Current status, None when the stack does not exist
    pub(crate) async fn status(&self, name: &str) -> eyre::Result<Option<StackStatus>> {
        let result = self.client.describe_stacks().stack_name(name).send().await;

        match result {
            Ok(output) => Ok(output
                .stacks()
                .first()
                .and_then(|stack| stack.stack_status())
                .map(|status| StackStatus::from_status(status.as_str()))),

            Err(SdkError::ServiceError(err))
                if is_missing_stack(err.err().meta().code(), err.err().meta().message()) =>
            {
                Ok(None)
            }

            Err(e) => Err(e).wrap_err(format!("Failed to describe stack {name}")),
        }
    }

    /// Create the stack, or update it when it already exists
    pub(crate) async fn provision(&self, name: &str, template: &Template) -> eyre::Result<Provision> {
        let body = template.to_json()?;
        let status = self.status(name).await?;

        if let Some(status) = &status {
            if !status.is_terminal() {
                return Err(eyre::eyre!("Stack {name} is busy ({status})"));
            }
        }

        let exists = match status {
            Some(status) if status.requires_recreate() => {
                log::warn!("Stack {name} is in {status}, deleting it before creating again");
                self.destroy(name).await?;
                ensure_deleted(name, &self.wait(name).await?)?;
                false
            }
            Some(_) => true,
            None => false,
        };

        if !exists {
            self.client
                .create_stack()
                .stack_name(name)
                .template_body(body)
                .capabilities(Capability::CapabilityIam)
                .set_role_arn(self.execution_role_arn.clone())
                .send()
                .await
                .wrap_err("Failed to create stack")?;

            return Ok(Provision::Created);
        }

        let result = self
            .client
            .update_stack()
            .stack_name(name)
            .template_body(body)
            .capabilities(Capability::CapabilityIam)
            .set_role_arn(self.execution_role_arn.clone())
            .send()
            .await;

        match result {
            Ok(_) => Ok(Provision::Updated),

            Err(SdkError::ServiceError(err))
                if is_unchanged(err.err().meta().code(), err.err().meta().message()) =>
            {
                Ok(Provision::Unchanged)
            }

            Err(e) => Err(e).wrap_err("Failed to update stack"),
        }
    }

    pub(crate) async fn destroy(&self, name: &str) -> eyre::Result<()> {
        self.client
            .delete_stack()
            .stack_name(name)
            .set_role_arn(self.execution_role_arn.clone())
            .send()
            .await
            .wrap_err("Failed to delete stack")?;

        Ok(())
    }

    /// Poll until the stack settles
    pub(crate) async fn wait(&self, name: &str) -> eyre::Result<StackStatus> {
        let spinner = Logger::spinner(name);

        loop {
            let status = self.status(name).await?.unwrap_or(StackStatus::Deleted);

            if status.is_terminal() {
                spinner.finish_and_clear();
                return Ok(status);
            }

            spinner.set_message(format!("{name} {}", console::style(&status).dim()));
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Failed resources of the latest operation on the stack
    pub(crate) async fn failures(&self, name: &str) -> eyre::Result<Vec<Event>> {
        let mut next_token = None;
        let mut events = Vec::new();

        loop {
            let mut request = self.client.describe_stack_events().stack_name(name);

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = request
                .send()
                .await
                .wrap_err(format!("Failed to describe events of {name}"))?;

            let page: Vec<Event> = response.stack_events().iter().map(Event::from).collect();
            let is_complete = page.iter().any(Event::is_operation_start);
            events.extend(page);

            next_token = response.next_token().map(str::to_string);

            if next_token.is_none() || is_complete {
                break;
            }
        }

        Ok(latest_failures(&events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(logical_id: &str, resource_type: &str, status: &str, reason: Option<&str>) -> Event {
        Event {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            status: status.into(),
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            StackStatus::from_status("CREATE_COMPLETE"),
            StackStatus::Complete("CREATE_COMPLETE".into())
        );
        assert_eq!(StackStatus::from_status("DELETE_COMPLETE"), StackStatus::Deleted);

        for status in [
            "CREATE_IN_PROGRESS",
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            "UPDATE_ROLLBACK_IN_PROGRESS",
            "REVIEW_IN_PROGRESS",
        ] {
            assert!(!StackStatus::from_status(status).is_terminal(), "{status}");
        }

        for status in [
            "CREATE_FAILED",
            "ROLLBACK_COMPLETE",
            "UPDATE_ROLLBACK_COMPLETE",
            "DELETE_FAILED",
        ] {
            assert!(
                matches!(StackStatus::from_status(status), StackStatus::Failed(_)),
                "{status}"
            );
        }
    }

    #[test]
    fn test_only_failed_creation_requires_recreate() {
        assert!(StackStatus::from_status("ROLLBACK_COMPLETE").requires_recreate());
        assert!(!StackStatus::from_status("UPDATE_ROLLBACK_COMPLETE").requires_recreate());
        assert!(!StackStatus::from_status("UPDATE_COMPLETE").requires_recreate());
    }

    #[test]
    fn test_latest_failures_stop_at_operation_start() {
        let events = vec![
            event("dev-PipelineStack", STACK_RESOURCE_TYPE, "UPDATE_ROLLBACK_COMPLETE", None),
            event(
                "ArtifactBucket",
                "AWS::S3::Bucket",
                "UPDATE_FAILED",
                Some("fepu08-dev-aws-codepipeline-artifact-bucket already exists"),
            ),
            event("dev-PipelineStack", STACK_RESOURCE_TYPE, "UPDATE_FAILED", None),
            event("CIPipeline", "AWS::CodePipeline::Pipeline", "UPDATE_IN_PROGRESS", None),
            event(
                "dev-PipelineStack",
                STACK_RESOURCE_TYPE,
                "UPDATE_IN_PROGRESS",
                Some("User Initiated"),
            ),
            event("InfrastructureProject", "AWS::CodeBuild::Project", "CREATE_FAILED", None),
        ];

        let failures = latest_failures(&events);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].logical_id, "ArtifactBucket");
    }

    #[test]
    fn test_bootstrap_roles() {
        let roles = BootstrapRoles::new(DEFAULT_BOOTSTRAP_QUALIFIER, "123456789012", "eu-west-1");

        assert_eq!(
            roles.deploy,
            "arn:aws:iam::123456789012:role/cdk-hnb659fds-deploy-role-123456789012-eu-west-1"
        );
        assert_eq!(
            roles.execution,
            "arn:aws:iam::123456789012:role/cdk-hnb659fds-cfn-exec-role-123456789012-eu-west-1"
        );
    }

    #[test]
    fn test_bootstrap_deploy_role_is_assumable_from_the_pipeline() {
        let roles = BootstrapRoles::new("custom", "123456789012", "us-east-1");
        let (prefix, _) = fepu08_stacks::iam::DEPLOY_ROLE_PATTERN
            .split_once('*')
            .unwrap();
        let role_name = roles.deploy.rsplit('/').next().unwrap();

        assert!(roles.deploy.starts_with(prefix));
        assert!(role_name.starts_with("cdk-"));
        assert!(roles.deploy.contains("cdk-custom-deploy-role-"));
    }

    #[test]
    fn test_unset_role_falls_back_to_bootstrap_roles() {
        let roles = BootstrapRoles::new(DEFAULT_BOOTSTRAP_QUALIFIER, "123456789012", "eu-west-1");
        let (role_arn, execution_role_arn) =
            deploy_roles(&DeploySettings::default(), Some(roles.clone())).unwrap();

        assert_eq!(role_arn, roles.deploy);
        assert_eq!(execution_role_arn, Some(roles.execution));
    }

    #[test]
    fn test_explicit_roles_win_over_bootstrap_roles() {
        let settings = DeploySettings {
            role_arn: Some("arn:aws:iam::123456789012:role/cdk-deploy".into()),
            ..Default::default()
        };

        let (role_arn, execution_role_arn) = deploy_roles(&settings, None).unwrap();
        assert_eq!(role_arn, "arn:aws:iam::123456789012:role/cdk-deploy");
        assert_eq!(execution_role_arn, None);

        let settings = DeploySettings {
            execution_role_arn: Some("arn:aws:iam::123456789012:role/cdk-exec".into()),
            ..Default::default()
        };

        let roles = BootstrapRoles::new(DEFAULT_BOOTSTRAP_QUALIFIER, "123456789012", "eu-west-1");
        let (role_arn, execution_role_arn) = deploy_roles(&settings, Some(roles.clone())).unwrap();
        assert_eq!(role_arn, roles.deploy);
        assert_eq!(
            execution_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/cdk-exec")
        );

        assert!(deploy_roles(&DeploySettings::default(), None).is_err());
    }

    #[test]
    fn test_missing_stack_error() {
        assert!(is_missing_stack(
            Some("ValidationError"),
            Some("Stack with id dev-PipelineStack does not exist"),
        ));
        assert!(!is_missing_stack(
            Some("ValidationError"),
            Some("1 validation error detected: Value 'dev_stack' at 'stackName' failed to satisfy constraint"),
        ));
        assert!(!is_missing_stack(Some("AccessDenied"), Some("Stack does not exist")));
        assert!(!is_missing_stack(None, None));
    }

    #[test]
    fn test_no_updates_error() {
        assert!(is_unchanged(
            Some("ValidationError"),
            Some("No updates are to be performed."),
        ));
        assert!(!is_unchanged(
            Some("ValidationError"),
            Some("Stack:arn:aws:cloudformation:eu-west-1:123456789012:stack/dev-InfrastructureStack is in UPDATE_IN_PROGRESS state and can not be updated."),
        ));
        assert!(!is_unchanged(Some("ValidationError"), None));
    }

    #[test]
    fn test_recreation_requires_deleted_stack() {
        assert!(ensure_deleted("dev-InfrastructureStack", &StackStatus::Deleted).is_ok());

        let error = ensure_deleted(
            "dev-InfrastructureStack",
            &StackStatus::from_status("DELETE_FAILED"),
        )
        .unwrap_err();

        assert!(error.to_string().contains("DELETE_FAILED"));
        assert!(error.to_string().contains("dev-InfrastructureStack"));
    }
}
