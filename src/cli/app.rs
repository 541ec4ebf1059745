use super::commands::config::ConfigCommands;
use super::commands::demo::DemoCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shellbridge")]
#[command(about = "Cross-window event and navigation bridge for multi-window desktop shells")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the two-window bridge demo over an in-process transport
    Demo(DemoCommands),
    /// Show the resolved configuration
    Config(ConfigCommands),
}
