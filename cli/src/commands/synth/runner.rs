use crate::commands::synth::SynthCommand;
use crate::error::Error;
use crate::runner::Runner;
use eyre::WrapErr;
use std::fs;

pub(crate) struct SynthRunner {
    pub(crate) command: SynthCommand,
}

impl Runner for SynthRunner {
    /// Render the templates into the output directory
    async fn run(&mut self) -> Result<(), Error> {
        let project = self.command.project.load()?;
        let out = &self.command.out;

        fs::create_dir_all(out)
            .inspect_err(|e| log::error!("Error: {e:?}"))
            .wrap_err(Error::new(
                "Failed to create output directory",
                Some("Check file system permissions."),
            ))?;

        for stack in project.stacks(self.command.stack)? {
            let path = out.join(format!("{}.template.json", stack.name()));
            let body = stack.template()?.to_json()?;

            fs::write(&path, body)
                .inspect_err(|e| log::error!("Error: {e:?}"))
                .wrap_err(Error::new(
                    &format!("Failed to write {}", path.to_string_lossy()),
                    Some("Check file system permissions."),
                ))?;

            println!(
                "{} {}",
                console::style("Synthesized").green().bold(),
                console::style(path.to_string_lossy()).dim()
            );
        }

        Ok(())
    }
}
