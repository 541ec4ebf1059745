use anyhow::Result;
use clap::Parser;
use log::info;

use shellbridge::cli::Cli;
use shellbridge::cli::app::Commands;
use shellbridge::cli::commands::{config_command, demo_command};
use shellbridge::config::ShellConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("shellbridge.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting shellbridge");

    let config = ShellConfig::load()?;

    match cli.command {
        Commands::Demo(demo_args) => {
            demo_command(demo_args, config).await?;
        }
        Commands::Config(config_args) => {
            config_command(config_args, config).await?;
        }
    }

    Ok(())
}
