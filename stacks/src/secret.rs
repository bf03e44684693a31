/// Secrets Manager entry holding the GitHub OAuth token
pub const GITHUB_TOKEN_SECRET: &str = "github-token";

/// A secret resolved by CloudFormation at deploy time
///
/// Only the name is kept, the value never passes through this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretReference {
    name: String,
}

impl SecretReference {
    pub fn new(name: &str) -> Self {
        SecretReference {
            name: name.to_string(),
        }
    }

    pub fn github_token() -> Self {
        SecretReference::new(GITHUB_TOKEN_SECRET)
    }

    /// https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/dynamic-references-secretsmanager.html
    pub fn dynamic_reference(&self) -> String {
        format!("{{{{resolve:secretsmanager:{}:SecretString:::}}}}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_reference() {
        assert_eq!(
            SecretReference::github_token().dynamic_reference(),
            "{{resolve:secretsmanager:github-token:SecretString:::}}"
        );
    }
}
