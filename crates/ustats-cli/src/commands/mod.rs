//! CLI subcommand implementations.

pub mod import;
pub mod query;
pub mod record;
pub mod status;
pub mod util;
