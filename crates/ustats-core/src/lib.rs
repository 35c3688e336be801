//! Core domain logic for usage statistics.
//!
//! This crate contains the fundamental types and rules for:
//! - Event kinds and the events producers emit
//! - Per-kind record shapes and the [`Record`] capability trait
//! - Merging same-identity records
//! - Calendar bucketing granularity
//! - The in-memory bucket [`Document`]

pub mod document;
pub mod event;
mod granularity;
mod kind;
pub mod merge;
pub mod record;
mod types;

pub use document::{Document, SCHEMA_VERSION};
pub use event::{EventPayload, UsageEvent};
pub use granularity::Granularity;
pub use kind::Kind;
pub use merge::{MergeError, is_mergeable, merge, merge_into};
pub use record::{
    CommandRecord, DateList, FileRecord, Interval, LaunchKey, LaunchRecord, LaunchTotals,
    Measure, PartRecord, PerspectiveRecord, Record, SessionRecord,
};
pub use types::ValidationError;
