use crate::cloudformation::StackStatus;
use crate::commands::destroy::DestroyCommand;
use crate::error::Error;
use crate::runner::Runner;

pub(crate) struct DestroyRunner {
    pub(crate) command: DestroyCommand,
}

impl Runner for DestroyRunner {
    /// Delete the selected stacks, in reverse deployment order
    async fn run(&mut self) -> Result<(), Error> {
        let project = self.command.project.load()?;
        let client = self.client(&project).await?;

        for stack in project.stacks(self.command.stack)?.iter().rev() {
            let name = stack.name();

            if client.status(&name).await?.is_none() {
                println!("{} {name} is not deployed", console::style("Skipped").yellow().bold());
                continue;
            }

            println!("{} {name}...", console::style("Destroying").red().bold());
            client.destroy(&name).await?;

            match client.wait(&name).await? {
                StackStatus::Deleted => println!("{} {name}", console::style("Done").green().bold()),
                status => return Err(self.stack_error(&client, &name, &status).await),
            }
        }

        Ok(())
    }
}
