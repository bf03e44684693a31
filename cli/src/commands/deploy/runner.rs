use crate::cloudformation::{Provision, StackStatus};
use crate::commands::deploy::DeployCommand;
use crate::error::Error;
use crate::runner::Runner;

pub(crate) struct DeployRunner {
    pub(crate) command: DeployCommand,
}

impl Runner for DeployRunner {
    /// Provision every selected stack and wait for each to settle
    async fn run(&mut self) -> Result<(), Error> {
        let project = self.command.project.load()?;
        let client = self.client(&project).await?;

        for stack in project.stacks(self.command.stack)? {
            let name = stack.name();
            let template = stack.template()?;

            println!("{} {name}...", console::style("Deploying").green().bold());

            match client.provision(&name, &template).await? {
                Provision::Unchanged => {
                    println!("{} {name} is up to date", console::style("Done").green().bold());
                    continue;
                }
                provision => log::info!("{name}: {provision:?}"),
            }

            match client.wait(&name).await? {
                StackStatus::Complete(_) => {
                    println!("{} {name}", console::style("Done").green().bold())
                }
                status => return Err(self.stack_error(&client, &name, &status).await),
            }
        }

        Ok(())
    }
}
