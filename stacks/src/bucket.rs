use crate::iam::{trust_policy, LAMBDA};
use crate::template::{get_att, reference, sub, CfnResource};
use serde_json::json;

const AUTO_DELETE_OBJECTS_HANDLER: &str = include_str!("auto_delete_objects.py");

/// What happens to the bucket when it leaves the stack
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// The bucket is deleted together with the stack
    Destroy,

    /// The bucket is orphaned and stays in the account
    #[default]
    Retain,
}

impl RemovalPolicy {
    fn as_str(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

/// S3 bucket declaration
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    logical_id: String,
    name: String,
    removal_policy: RemovalPolicy,
    auto_delete_objects: bool,
}

impl Bucket {
    pub fn new(logical_id: &str, name: &str) -> Self {
        Bucket {
            logical_id: logical_id.to_string(),
            name: name.to_string(),
            removal_policy: RemovalPolicy::default(),
            auto_delete_objects: false,
        }
    }

    pub fn with_removal_policy(mut self, removal_policy: RemovalPolicy) -> Self {
        self.removal_policy = removal_policy;
        self
    }

    /// Empty the bucket before CloudFormation deletes it
    ///
    /// S3 refuses to delete a bucket with objects in it.
    pub fn with_auto_delete_objects(mut self, auto_delete_objects: bool) -> Self {
        self.auto_delete_objects = auto_delete_objects;
        self
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> serde_json::Value {
        get_att(&self.logical_id, "Arn")
    }

    /// The bucket and, with auto deletion, the clean up machinery
    pub fn resources(&self) -> eyre::Result<Vec<CfnResource>> {
        if self.auto_delete_objects && self.removal_policy != RemovalPolicy::Destroy {
            return Err(eyre::eyre!(
                "Bucket {} auto deletes objects, but its removal policy is not Destroy",
                self.logical_id
            ));
        }

        let policy = self.removal_policy.as_str();

        let mut resources = vec![CfnResource::new(
            &self.logical_id,
            json!({
                "Type": "AWS::S3::Bucket",
                "Properties": {
                    "BucketName": self.name
                },
                "DeletionPolicy": policy,
                "UpdateReplacePolicy": policy
            }),
        )];

        if self.auto_delete_objects {
            resources.extend(self.auto_delete_resources());
        }

        Ok(resources)
    }

    fn auto_delete_resources(&self) -> Vec<CfnResource> {
        let id = &self.logical_id;
        let provider = format!("{id}AutoDeleteObjectsProvider");
        let provider_role = format!("{id}AutoDeleteObjectsProviderRole");
        let bucket_policy = format!("{id}Policy");

        vec![
            CfnResource::new(
                &provider_role,
                json!({
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": trust_policy(&[LAMBDA]).to_value(),
                        "ManagedPolicyArns": [sub(
                            "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"
                        )]
                    }
                }),
            ),
            CfnResource::new(
                &provider,
                json!({
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Description": format!("Empties {} before it is deleted", self.name),
                        "Handler": "index.handler",
                        "Runtime": "python3.12",
                        "MemorySize": 128,
                        "Timeout": 900,
                        "Role": get_att(&provider_role, "Arn"),
                        "Code": {"ZipFile": AUTO_DELETE_OBJECTS_HANDLER}
                    },
                    "DependsOn": [provider_role]
                }),
            ),
            CfnResource::new(
                &bucket_policy,
                json!({
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {
                        "Bucket": reference(id),
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": {"AWS": get_att(&provider_role, "Arn")},
                                "Action": [
                                    "s3:DeleteObject*",
                                    "s3:GetBucket*",
                                    "s3:List*",
                                    "s3:PutBucketPolicy"
                                ],
                                "Resource": [
                                    self.arn(),
                                    {"Fn::Join": ["", [self.arn(), "/*"]]}
                                ]
                            }]
                        }
                    }
                }),
            ),
            CfnResource::new(
                &format!("{id}AutoDeleteObjects"),
                json!({
                    "Type": "Custom::S3AutoDeleteObjects",
                    "Properties": {
                        "ServiceToken": get_att(&provider, "Arn"),
                        "BucketName": reference(id)
                    },
                    "DependsOn": [bucket_policy],
                    "DeletionPolicy": "Delete",
                    "UpdateReplacePolicy": "Delete"
                }),
            ),
        ]
    }
}
