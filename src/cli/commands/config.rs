//! Show the resolved configuration.

use anyhow::Result;
use clap::Args;
use colored::*;

use crate::config::ShellConfig;

#[derive(Args)]
pub struct ConfigCommands {}

pub async fn config_command(_args: ConfigCommands, config: ShellConfig) -> Result<()> {
    let path = ShellConfig::config_path()?;
    let defaults = ShellConfig::default();

    println!();
    println!("  {}", "⚙ shellbridge configuration".bright_blue().bold());
    println!("  {}", "═══════════════════════════".bright_blue());
    println!();
    println!(
        "  {}: {}",
        "File".dimmed(),
        path.display().to_string().cyan()
    );
    if !path.exists() {
        println!("  {}", "(not present, using defaults)".dimmed());
    }
    println!();
    print_value(
        "devtools_poll_interval_ms",
        config.devtools_poll_interval_ms,
        defaults.devtools_poll_interval_ms,
    );
    print_value(
        "debug_console_capacity",
        config.debug_console_capacity,
        defaults.debug_console_capacity,
    );
    println!();
    Ok(())
}

fn print_value<T: std::fmt::Display + PartialEq>(key: &str, value: T, default: T) {
    let marker = if value == default {
        "(default)".dimmed()
    } else {
        "(from file)".bright_yellow()
    };
    println!("  {}: {} {}", key.dimmed(), value.to_string().bright_white(), marker);
}
