use crate::bucket::{Bucket, RemovalPolicy};
use crate::buildspec::{BuildSpec, BUILD_IMAGE, COMPUTE_TYPE, CONTAINER_TYPE};
use crate::environment::{BuildEnvironment, DeployEnvironment};
use crate::iam::{deploy_role_statement, trust_policy, PolicyDocument, PolicyStatement};
use crate::iam::{CODEBUILD, CODEPIPELINE};
use crate::naming::Naming;
use crate::secret::SecretReference;
use crate::stack::Stack;
use crate::template::{get_att, reference, sub, CfnResource, Template};
use serde_json::{json, Value};

pub const DEPLOY_ROLE: &str = "InfrastructureDeployRole";
pub const DEPLOY_ROLE_POLICY: &str = "InfrastructureDeployRoleDefaultPolicy";
pub const DEPLOY_PERMISSIONS: &str = "CdkDeployPermissions";
pub const ARTIFACT_BUCKET: &str = "ArtifactBucket";
pub const BUILD_PROJECT: &str = "InfrastructureProject";
pub const PIPELINE: &str = "CIPipeline";
pub const WEBHOOK: &str = "CIPipelineWebhook";
pub const SOURCE_OUTPUT: &str = "InfraStructureSourceOutput";
pub const SOURCE_ACTION: &str = "GitHub_Source";
pub const DEPLOY_ACTION: &str = "DeployInfrastructure";

/// Inputs of the pipeline stack
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineProps {
    pub environment: DeployEnvironment,

    /// GitHub user or organization owning the repository
    pub repository_owner: String,

    pub repository_name: String,
    pub branch: String,
    pub naming: Naming,
}

/// A single action of a pipeline stage
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Pull a branch of a GitHub repository
    GitHubSource {
        name: String,
        owner: String,
        repo: String,
        branch: String,
        oauth_token: SecretReference,
        output: String,
    },

    /// Run a CodeBuild project against an artifact
    CodeBuild {
        name: String,
        project: String,
        input: String,
        role: String,
    },
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::GitHubSource { name, .. } | Action::CodeBuild { name, .. } => name,
        }
    }

    pub fn input(&self) -> Option<&str> {
        match self {
            Action::GitHubSource { .. } => None,
            Action::CodeBuild { input, .. } => Some(input.as_str()),
        }
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            Action::GitHubSource { output, .. } => Some(output.as_str()),
            Action::CodeBuild { .. } => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Action::GitHubSource {
                name,
                owner,
                repo,
                branch,
                oauth_token,
                output,
            } => json!({
                "Name": name,
                "ActionTypeId": {
                    "Category": "Source",
                    "Owner": "ThirdParty",
                    "Provider": "GitHub",
                    "Version": "1"
                },
                "Configuration": {
                    "Owner": owner,
                    "Repo": repo,
                    "Branch": branch,
                    "OAuthToken": oauth_token.dynamic_reference(),

                    // The webhook triggers runs
                    "PollForSourceChanges": false
                },
                "OutputArtifacts": [{"Name": output}],
                "RunOrder": 1
            }),

            Action::CodeBuild {
                name,
                project,
                input,
                role,
            } => json!({
                "Name": name,
                "ActionTypeId": {
                    "Category": "Build",
                    "Owner": "AWS",
                    "Provider": "CodeBuild",
                    "Version": "1"
                },
                "Configuration": {
                    "ProjectName": reference(project)
                },
                "InputArtifacts": [{"Name": input}],
                "RoleArn": get_att(role, "Arn"),
                "RunOrder": 1
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub name: String,
    pub actions: Vec<Action>,
}

impl Stage {
    fn to_value(&self) -> Value {
        json!({
            "Name": self.name,
            "Actions": self.actions.iter().map(Action::to_value).collect::<Vec<_>>()
        })
    }
}

/// Declares the CI pipeline deploying the storage stack
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineStack {
    props: PipelineProps,
}

impl PipelineStack {
    pub fn new(props: PipelineProps) -> Self {
        PipelineStack { props }
    }

    pub fn build_environment(&self) -> BuildEnvironment {
        BuildEnvironment::new(&self.props.environment)
    }

    pub fn artifact_bucket(&self) -> Bucket {
        Bucket::new(
            ARTIFACT_BUCKET,
            &self.props.naming.artifact_bucket(&self.props.environment),
        )
        .with_removal_policy(RemovalPolicy::Destroy)
        .with_auto_delete_objects(true)
    }

    /// Source, then Deploy, each with one action
    pub fn stages(&self) -> Vec<Stage> {
        let props = &self.props;

        vec![
            Stage {
                name: "Source".into(),
                actions: vec![Action::GitHubSource {
                    name: SOURCE_ACTION.into(),
                    owner: props.repository_owner.clone(),
                    repo: props.repository_name.clone(),
                    branch: props.branch.clone(),
                    oauth_token: SecretReference::github_token(),
                    output: SOURCE_OUTPUT.into(),
                }],
            },
            Stage {
                name: "Deploy".into(),
                actions: vec![Action::CodeBuild {
                    name: DEPLOY_ACTION.into(),
                    project: BUILD_PROJECT.into(),
                    input: SOURCE_OUTPUT.into(),
                    role: DEPLOY_ROLE.into(),
                }],
            },
        ]
    }

    /// Execution identity shared by CodeBuild and CodePipeline
    fn deploy_role(&self) -> CfnResource {
        CfnResource::new(
            DEPLOY_ROLE,
            json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": trust_policy(&[CODEBUILD, CODEPIPELINE]).to_value(),
                    "Policies": [{
                        "PolicyName": DEPLOY_PERMISSIONS,
                        "PolicyDocument": PolicyDocument::new(vec![deploy_role_statement()]).to_value()
                    }]
                }
            }),
        )
    }

    /// Grants the services need to run the pipeline itself
    ///
    /// Kept apart from the inline policy, which only allows elevating into deploy roles.
    fn deploy_role_policy(&self, bucket: &Bucket) -> CfnResource {
        let bucket_objects = json!({"Fn::Join": ["", [bucket.arn(), "/*"]]});
        let log_group =
            "arn:${AWS::Partition}:logs:${AWS::Region}:${AWS::AccountId}:log-group:/aws/codebuild/${InfrastructureProject}";

        let document = PolicyDocument::new(vec![
            PolicyStatement::allow(
                &[
                    "s3:Abort*",
                    "s3:DeleteObject*",
                    "s3:GetBucket*",
                    "s3:GetObject*",
                    "s3:List*",
                    "s3:PutObject",
                    "s3:PutObjectLegalHold",
                    "s3:PutObjectRetention",
                    "s3:PutObjectTagging",
                    "s3:PutObjectVersionTagging",
                ],
                vec![bucket.arn(), bucket_objects],
            ),
            PolicyStatement::allow(
                &[
                    "logs:CreateLogGroup",
                    "logs:CreateLogStream",
                    "logs:PutLogEvents",
                ],
                vec![sub(log_group), sub(&format!("{log_group}:*"))],
            ),
            PolicyStatement::allow(
                &[
                    "codebuild:BatchPutCodeCoverages",
                    "codebuild:BatchPutTestCases",
                    "codebuild:CreateReport",
                    "codebuild:CreateReportGroup",
                    "codebuild:UpdateReport",
                ],
                vec![sub(
                    "arn:${AWS::Partition}:codebuild:${AWS::Region}:${AWS::AccountId}:report-group/${InfrastructureProject}-*",
                )],
            ),
            PolicyStatement::allow(
                &[
                    "codebuild:BatchGetBuilds",
                    "codebuild:StartBuild",
                    "codebuild:StopBuild",
                ],
                vec![get_att(BUILD_PROJECT, "Arn")],
            ),
        ]);

        CfnResource::new(
            DEPLOY_ROLE_POLICY,
            json!({
                "Type": "AWS::IAM::Policy",
                "Properties": {
                    "PolicyName": DEPLOY_ROLE_POLICY,
                    "PolicyDocument": document.to_value(),
                    "Roles": [reference(DEPLOY_ROLE)]
                }
            }),
        )
    }

    fn build_project(&self) -> eyre::Result<CfnResource> {
        let build = self.build_environment();
        let variables = build
            .variables()
            .into_iter()
            .map(|(name, value)| json!({"Name": name, "Type": "PLAINTEXT", "Value": value}))
            .collect::<Vec<_>>();

        Ok(CfnResource::new(
            BUILD_PROJECT,
            json!({
                "Type": "AWS::CodeBuild::Project",
                "Properties": {
                    "Artifacts": {"Type": "CODEPIPELINE"},
                    "Environment": {
                        "ComputeType": COMPUTE_TYPE,
                        "Image": BUILD_IMAGE,
                        "ImagePullCredentialsType": "CODEBUILD",
                        "PrivilegedMode": false,
                        "Type": CONTAINER_TYPE,
                        "EnvironmentVariables": variables
                    },
                    "ServiceRole": get_att(DEPLOY_ROLE, "Arn"),
                    "Source": {
                        "Type": "CODEPIPELINE",
                        "BuildSpec": BuildSpec::deploy(&build).to_json()?
                    },
                    "EncryptionKey": "alias/aws/s3"
                }
            }),
        ))
    }

    fn pipeline(&self) -> CfnResource {
        let stages = self
            .stages()
            .iter()
            .map(Stage::to_value)
            .collect::<Vec<_>>();

        CfnResource::new(
            PIPELINE,
            json!({
                "Type": "AWS::CodePipeline::Pipeline",
                "Properties": {
                    "Name": self.props.naming.pipeline(&self.props.environment),
                    "RoleArn": get_att(DEPLOY_ROLE, "Arn"),
                    "ArtifactStore": {
                        "Type": "S3",
                        "Location": reference(ARTIFACT_BUCKET)
                    },
                    "Stages": stages
                },
                "DependsOn": [DEPLOY_ROLE_POLICY, DEPLOY_ROLE]
            }),
        )
    }

    /// Lets GitHub start a run on every push to the branch
    fn webhook(&self) -> CfnResource {
        CfnResource::new(
            WEBHOOK,
            json!({
                "Type": "AWS::CodePipeline::Webhook",
                "Properties": {
                    "Authentication": "GITHUB_HMAC",
                    "AuthenticationConfiguration": {
                        "SecretToken": SecretReference::github_token().dynamic_reference()
                    },
                    "Filters": [{
                        "JsonPath": "$.ref",
                        "MatchEquals": "refs/heads/{Branch}"
                    }],
                    "TargetAction": SOURCE_ACTION,
                    "TargetPipeline": reference(PIPELINE),
                    "TargetPipelineVersion": 1,
                    "RegisterWithThirdParty": true
                }
            }),
        )
    }
}

impl Stack for PipelineStack {
    fn name(&self) -> String {
        self.props.naming.pipeline_stack(&self.props.environment)
    }

    fn template(&self) -> eyre::Result<Template> {
        let props = &self.props;
        log::info!(
            "Declaring pipeline for {}/{}@{} in the {} environment",
            props.repository_owner,
            props.repository_name,
            props.branch,
            props.environment
        );

        let bucket = self.artifact_bucket();
        let mut template = Template::new(&format!(
            "CI pipeline of the {} environment",
            props.environment
        ));

        template.add_resource(self.deploy_role());
        template.add_resource(self.deploy_role_policy(&bucket));
        template.add_resources(bucket.resources()?);
        template.add_resource(self.build_project()?);
        template.add_resource(self.pipeline());
        template.add_resource(self.webhook());

        template.add_output(
            "PipelineName",
            reference(PIPELINE),
            "Name of the CI pipeline",
        );
        template.add_output(
            "ArtifactBucketName",
            reference(ARTIFACT_BUCKET),
            "Name of the pipeline artifact bucket",
        );

        Ok(template)
    }
}
