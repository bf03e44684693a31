use crate::cloudformation::{Client, StackStatus};
use crate::error::Error;
use crate::project::Project;
use std::error::Error as StdError;

pub(crate) trait Runner {
    /// CloudFormation client authenticated as configured for the project
    async fn client(&self, project: &Project) -> Result<Client, Error> {
        Client::new(&project.deploy).await.map_err(|e| {
            self.error(
                Some("Failed to set up AWS client"),
                Some("Check your AWS credentials and the [deploy] section of fepu08.toml."),
                Some(e.into()),
            )
        })
    }

    /// Run the command
    ///
    /// Returns an error shown to the user in case of failure
    async fn run(&mut self) -> Result<(), Error>;

    /// Construct an error shown to the user
    fn error(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        origin: Option<Box<dyn StdError>>,
    ) -> Error {
        if let Some(origin) = origin {
            log::error!("{origin:?}");
        }

        if let Some(title) = title {
            Error::new(title, description)
        } else {
            Error::new("Failed to run the command", Some("Run again with RUST_LOG=info for details."))
        }
    }

    /// Explain why a stack ended up in a failed status
    async fn stack_error(&self, client: &Client, name: &str, status: &StackStatus) -> Error {
        let failures = match client.failures(name).await {
            Ok(failures) => failures,
            Err(e) => return self.error(Some(&format!("{name} ended in {status}")), None, Some(e.into())),
        };

        let details = failures
            .iter()
            .map(|f| {
                format!(
                    "{} ({}): {}",
                    f.logical_id,
                    f.resource_type,
                    f.reason.as_deref().unwrap_or("no reason given")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.error(
            Some(&format!("{name} ended in {status}")),
            if details.is_empty() { None } else { Some(details.as_str()) },
            None,
        )
    }
}

/// Return a runner for a command
pub(crate) trait Runnable {
    fn runner(&self) -> impl Runner;
}
