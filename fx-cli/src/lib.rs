//! # fx-cli
//!
//! `teamsfx` command line: argument parsing and the mapping of commands onto the bot
//! plugin lifecycle.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{execute, render_config, App, ConsoleInteraction};
