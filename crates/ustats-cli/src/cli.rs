//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ustats_core::Kind;

/// Usage statistics recorder.
///
/// Records file, command, perspective, part, launch and session usage into
/// calendar-bucketed JSON files and aggregates it over date ranges.
#[derive(Debug, Parser)]
#[command(name = "ustats", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a single usage event and write it out.
    Record {
        /// When the usage happened: RFC 3339 or relative ("2 hours ago").
        /// Defaults to now.
        #[arg(long, global = true)]
        at: Option<String>,

        #[command(subcommand)]
        event: RecordEvent,
    },

    /// Import JSONL usage events from stdin.
    Import,

    /// Aggregate recorded usage of one kind over a date range.
    Query {
        /// Kind to aggregate (file, command, perspective, part, launch, session).
        kind: Kind,

        /// First day, inclusive: YYYY-MM-DD, "today", "yesterday" or "N days ago".
        #[arg(long)]
        start: Option<String>,

        /// Last day, inclusive. Same formats as --start.
        #[arg(long)]
        end: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the storage root and its bucket files.
    Status,
}

/// Usage events that can be recorded from the command line.
#[derive(Debug, Subcommand)]
pub enum RecordEvent {
    /// Time spent in a file.
    File {
        /// Path of the file.
        path: String,

        /// Milliseconds spent.
        #[arg(long)]
        duration_ms: u64,
    },

    /// Executions of a command.
    Command {
        /// Command identifier (e.g., cmd.save).
        command_id: String,

        /// Number of executions.
        #[arg(long, default_value_t = 1)]
        count: u64,
    },

    /// Time a perspective was active.
    Perspective {
        /// Perspective identifier.
        id: String,

        /// Milliseconds spent.
        #[arg(long)]
        duration_ms: u64,
    },

    /// Time a workbench part had focus.
    Part {
        /// Part identifier.
        id: String,

        /// Milliseconds spent.
        #[arg(long)]
        duration_ms: u64,
    },

    /// One run of a launch configuration.
    Launch {
        /// Launch configuration name.
        name: String,

        /// Launch type identifier.
        #[arg(long = "type")]
        launch_type_id: String,

        /// Launch mode identifier (e.g., run, debug).
        #[arg(long = "mode")]
        launch_mode_id: String,

        /// Milliseconds the launch ran.
        #[arg(long, default_value_t = 0)]
        duration_ms: u64,

        /// Files involved in the launch. Repeatable.
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Active working time.
    Session {
        /// Milliseconds of activity.
        #[arg(long)]
        duration_ms: u64,
    },
}
