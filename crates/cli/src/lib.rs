//! Thin command-line shell over the agentsync engine crates.
//!
//! Argument parsing, settings resolution, and output formatting live here;
//! composition, detection, and resolution are delegated to
//! `agentsync-prompt`, `agentsync_sync`, and `agentsync-state`.

mod app;
mod cli;
mod commands;

pub use app::run;
pub use cli::{Cli, Commands};
