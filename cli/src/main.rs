mod cloudformation;
mod commands;
mod config;
mod context;
mod error;
mod logger;
mod project;
mod runner;
use crate::commands::Commands;
use crate::error::Error;
use crate::logger::Logger;
use crate::runner::{Runnable, Runner};
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "fepu08",
    version,
    about = "Synthesize and deploy the infrastructure bucket and CI pipeline stacks",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable) -> Result<(), Error> {
    command.runner().run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("Failed to install error report handler: {e}");
    }

    Logger::init();

    // Match all commands here, in one place
    let result = match Cli::parse().command {
        Commands::Synth(cmd) => run(cmd).await,
        Commands::Deploy(cmd) => run(cmd).await,
        Commands::Destroy(cmd) => run(cmd).await,
        Commands::Status(cmd) => run(cmd).await,
    };

    if let Err(error) = result {
        eprintln!("\n{}\n{error}", console::style("Error").red().bold());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
