use crate::cloudformation::StackStatus;
use crate::commands::status::StatusCommand;
use crate::error::Error;
use crate::runner::Runner;

pub(crate) struct StatusRunner {
    pub(crate) command: StatusCommand,
}

impl Runner for StatusRunner {
    async fn run(&mut self) -> Result<(), Error> {
        let project = self.command.project.load()?;
        let client = self.client(&project).await?;

        for stack in project.stacks(self.command.stack)? {
            let name = stack.name();

            let status = match client.status(&name).await? {
                Some(status) => status,
                None => {
                    println!("{} {}", name.as_str(), console::style("not deployed").dim());
                    continue;
                }
            };

            let styled = match &status {
                StackStatus::Complete(_) => console::style(status.to_string()).green(),
                StackStatus::InProgress(_) => console::style(status.to_string()).yellow(),
                StackStatus::Failed(_) | StackStatus::Deleted => {
                    console::style(status.to_string()).red()
                }
            };

            println!("{} {styled}", console::style(&name).bold());

            if matches!(status, StackStatus::Failed(_)) {
                for failure in client.failures(&name).await? {
                    println!(
                        "  {} {}",
                        failure.logical_id,
                        console::style(failure.reason.unwrap_or_default()).dim()
                    );
                }
            }
        }

        Ok(())
    }
}
