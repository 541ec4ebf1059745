//! Cross-window event and navigation bridge for multi-window desktop
//! shells: a typed pub/sub channel between windows, a global navigation
//! hook for imperative callers, and a mount/unmount sequencer that ties
//! both to a window's lifecycle.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod nav;
pub mod scope;
pub mod shell;
