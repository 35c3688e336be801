//! Storage layer for usage statistics.
//!
//! Events are kept in JSON bucket files, one per kind per calendar period
//! (monthly by default), directly under a storage root:
//!
//! ```text
//! <root>/command-2024-03.json
//! <root>/file-2024-03.json
//! <root>/session-2024-04.json
//! ```
//!
//! The write path ([`Storer`]) buffers events in memory and rewrites each
//! touched bucket as a whole on [`Storer::flush`]. The read path
//! ([`Accessor`]) loads every bucket overlapping a date range and sums
//! measures per key. [`Tracker`] bundles one of each per kind.
//!
//! # Thread Safety
//!
//! A [`Storer`] is `Send` but performs no locking of its own: the
//! read-modify-write cycle of a bucket assumes a single writer. Share a
//! [`Tracker`] behind a `Mutex` (see [`FlushWorker`]) to serialize writes
//! within a process. Flushes also take an advisory lock on `<root>/.lock`
//! so two processes sharing a root do not interleave.
//!
//! Readers never need a lock. Buckets are replaced by an atomic rename, so a
//! reader sees either the previous or the new version of a file.
//!
//! # Corrupt Buckets
//!
//! A bucket that exists but does not parse is never silently dropped. Queries
//! log it and skip it; a flush that needs to rewrite it first copies the
//! original bytes to `<bucket>.corrupt`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use ustats_core::{Kind, ValidationError};

mod accessor;
pub mod codec;
mod lock;
mod resolver;
mod storer;
mod tracker;
mod worker;

pub use accessor::Accessor;
pub use lock::StoreLock;
pub use resolver::BucketResolver;
pub use storer::Storer;
pub use tracker::{Aggregate, Tracker};
pub use worker::FlushWorker;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file failed.
    #[error("i/o error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A bucket file exists but does not hold a valid document.
    #[error("corrupt bucket {}: {}", .path.display(), .reason)]
    CorruptData { path: PathBuf, reason: String },
    /// A document could not be encoded.
    #[error("failed to serialize bucket document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// An event was handed to the store of another kind.
    #[error("{actual} event delivered to the {expected} store")]
    KindMismatch { expected: Kind, actual: Kind },
    /// An event failed validation.
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    /// The storage root lock could not be taken.
    #[error("failed to lock {}: {}", .path.display(), .source)]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for [`StoreError::CorruptData`].
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}
