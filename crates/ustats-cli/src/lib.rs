//! Usage statistics CLI library.
//!
//! This crate provides the CLI interface for recording and querying
//! usage statistics.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, RecordEvent};
pub use config::Config;
