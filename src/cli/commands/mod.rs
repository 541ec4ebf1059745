pub mod config;
pub mod demo;

pub use config::{ConfigCommands, config_command};
pub use demo::{DemoCommands, demo_command};
