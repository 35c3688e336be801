//! Buffered write path for one event kind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use ustats_core::{Document, Granularity, Record, UsageEvent, merge_into};

use crate::lock::StoreLock;
use crate::resolver::BucketResolver;
use crate::{StoreError, codec};

/// Writes records of kind `R` into their bucket files.
///
/// Events are buffered by day, already merged per identity, until
/// [`Storer::flush`] rewrites the touched buckets. Anything still buffered
/// when the storer is dropped is flushed; a failure there is only logged.
#[derive(Debug)]
pub struct Storer<R: Record> {
    resolver: BucketResolver,
    buffer: BTreeMap<NaiveDate, Vec<R>>,
}

impl<R: Record> Storer<R> {
    pub fn new(root: impl Into<PathBuf>, granularity: Granularity) -> Self {
        Self {
            resolver: BucketResolver::new(root, R::KIND, granularity),
            buffer: BTreeMap::new(),
        }
    }

    pub const fn resolver(&self) -> &BucketResolver {
        &self.resolver
    }

    /// Number of buffered records not yet written.
    pub fn pending(&self) -> usize {
        self.buffer.values().map(Vec::len).sum()
    }

    /// Converts `event` and buffers it. Nothing is written.
    pub fn insert(&mut self, event: &UsageEvent) -> Result<(), StoreError> {
        let record = R::from_event(event).ok_or(StoreError::KindMismatch {
            expected: R::KIND,
            actual: event.kind(),
        })?;
        event.validate()?;
        self.insert_record(event.date(), record);
        Ok(())
    }

    /// Buffers an already converted record for `date`.
    pub fn insert_record(&mut self, date: NaiveDate, record: R) {
        merge_into(self.buffer.entry(date).or_default(), record);
    }

    /// Buffers `event` and writes it out immediately.
    pub fn store(&mut self, event: &UsageEvent) -> Result<(), StoreError> {
        self.insert(event)?;
        self.flush()
    }

    /// Writes every buffered day into its bucket.
    ///
    /// Each touched bucket is read once, merged, and replaced atomically, in
    /// chronological order. Days whose bucket was written leave the buffer.
    /// On the first failure the flush stops and everything not yet written
    /// stays buffered for the next attempt. A no-op when nothing is buffered.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let _lock = StoreLock::acquire(self.resolver.root())?;

        let granularity = self.resolver.granularity();
        let mut buckets: BTreeMap<NaiveDate, Vec<NaiveDate>> = BTreeMap::new();
        for date in self.buffer.keys() {
            buckets
                .entry(granularity.period_start(*date))
                .or_default()
                .push(*date);
        }

        for (period, dates) in buckets {
            let path = self.resolver.resolve(period);
            let mut document = load_for_write(&self.resolver, period)?;
            for date in &dates {
                if let Some(records) = self.buffer.get(date) {
                    for record in records {
                        document.insert(*date, record.clone());
                    }
                }
            }
            codec::write(&document, &path)?;

            let mut written = 0;
            for date in &dates {
                written += self.buffer.remove(date).map_or(0, |records| records.len());
            }
            tracing::debug!(kind = %R::KIND, path = ?path, records = written, "flushed bucket");
        }

        Ok(())
    }
}

impl<R: Record> Drop for Storer<R> {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!(
                kind = %R::KIND,
                pending = self.pending(),
                error = %e,
                "dropping unflushed usage records"
            );
        }
    }
}

/// Loads a bucket for rewriting. A corrupt bucket is copied aside and
/// replaced by an empty document.
fn load_for_write(resolver: &BucketResolver, period: NaiveDate) -> Result<Document, StoreError> {
    match resolver.read(period) {
        Err(StoreError::CorruptData { path, reason }) => {
            let backup = codec::preserve(&path)?;
            tracing::warn!(
                path = ?path,
                backup = ?backup,
                reason = %reason,
                "bucket is corrupt; rewriting it from empty, original bytes kept in backup"
            );
            Ok(Document::default())
        }
        other => other,
    }
}
