use serde_json::{json, Value};

pub const POLICY_VERSION: &str = "2012-10-17";

pub const CODEBUILD: ServicePrincipal = ServicePrincipal("codebuild.amazonaws.com");
pub const CODEPIPELINE: ServicePrincipal = ServicePrincipal("codepipeline.amazonaws.com");
pub const LAMBDA: ServicePrincipal = ServicePrincipal("lambda.amazonaws.com");

/// Roles created by `cdk bootstrap` in every target account
pub const DEPLOY_ROLE_PATTERN: &str = "arn:aws:iam::*:role/cdk-*";

/// An AWS service allowed to assume a role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServicePrincipal(pub &'static str);

/// An Allow statement, the only kind the stacks grant
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyStatement {
    pub principals: Vec<ServicePrincipal>,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<Value>) -> Self {
        PolicyStatement {
            principals: vec![],
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut statement = json!({
            "Effect": "Allow",
            "Action": self.actions,
        });

        if !self.principals.is_empty() {
            statement["Principal"] = json!({
                "Service": self.principals.iter().map(|p| p.0).collect::<Vec<_>>()
            });
        }

        if !self.resources.is_empty() {
            statement["Resource"] = json!(self.resources);
        }

        statement
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolicyDocument {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        PolicyDocument { statements }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": self
                .statements
                .iter()
                .map(PolicyStatement::to_value)
                .collect::<Vec<_>>(),
        })
    }
}

/// Assume-role document trusting every given service
pub fn trust_policy(principals: &[ServicePrincipal]) -> PolicyDocument {
    PolicyDocument::new(vec![PolicyStatement {
        principals: principals.to_vec(),
        actions: vec!["sts:AssumeRole".into()],
        resources: vec![],
    }])
}

/// Lets the holder elevate into any account's deploy role
pub fn deploy_role_statement() -> PolicyStatement {
    PolicyStatement::allow(&["sts:AssumeRole"], vec![json!(DEPLOY_ROLE_PATTERN)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_policy_lists_all_services() {
        let document = trust_policy(&[CODEBUILD, CODEPIPELINE]).to_value();

        assert_eq!(
            document,
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {
                        "Service": ["codebuild.amazonaws.com", "codepipeline.amazonaws.com"]
                    },
                    "Action": ["sts:AssumeRole"]
                }]
            })
        );
    }

    #[test]
    fn test_deploy_role_statement() {
        assert_eq!(
            deploy_role_statement().to_value(),
            json!({
                "Effect": "Allow",
                "Action": ["sts:AssumeRole"],
                "Resource": ["arn:aws:iam::*:role/cdk-*"]
            })
        );
    }
}
