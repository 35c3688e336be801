//! Read path: range queries over bucket files.

use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use ustats_core::{DateList, Document, Granularity, Measure, Record, merge_into};

use crate::resolver::BucketResolver;
use crate::StoreError;

/// Answers aggregation queries for kind `R`.
///
/// Holds no state besides the storage roots; every query reads the buckets
/// as they are on disk at call time.
#[derive(Debug, Clone)]
pub struct Accessor<R> {
    resolvers: Vec<BucketResolver>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Accessor<R> {
    pub fn new(root: impl Into<PathBuf>, granularity: Granularity) -> Self {
        Self {
            resolvers: vec![BucketResolver::new(root, R::KIND, granularity)],
            _record: PhantomData,
        }
    }

    /// Also reads from `roots`, e.g. data copied over from another machine.
    ///
    /// A root that resolves to one already read from is skipped, so nothing
    /// is counted twice.
    #[must_use]
    pub fn with_extra_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let granularity = self.resolvers[0].granularity();
        for root in roots {
            let root = root.into();
            let canonical = canonical_root(&root);
            if self
                .resolvers
                .iter()
                .any(|resolver| canonical_root(resolver.root()) == canonical)
            {
                tracing::debug!(root = ?root, "skipping duplicate storage root");
                continue;
            }
            self.resolvers
                .push(BucketResolver::new(root, R::KIND, granularity));
        }
        self
    }

    /// Sums measures per key over every day in `[start, end]`, both inclusive.
    ///
    /// A reversed range yields an empty map.
    pub fn query(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<R::Key, R::Measure>, StoreError> {
        let mut totals: BTreeMap<R::Key, R::Measure> = BTreeMap::new();
        for document in self.load(start, end)? {
            for list in in_range::<R>(&document, start, end) {
                for record in &list.records {
                    totals
                        .entry(record.key(list.date))
                        .or_default()
                        .accumulate(record.measure());
                }
            }
        }
        Ok(totals)
    }

    /// The day lists in `[start, end]`, chronologically, with lists of the
    /// same day from different roots merged.
    pub fn records(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DateList<R>>, StoreError> {
        let mut days: BTreeMap<NaiveDate, Vec<R>> = BTreeMap::new();
        for document in self.load(start, end)? {
            for list in in_range::<R>(&document, start, end) {
                let records = days.entry(list.date).or_default();
                for record in &list.records {
                    merge_into(records, record.clone());
                }
            }
        }
        Ok(days
            .into_iter()
            .map(|(date, records)| DateList { date, records })
            .collect())
    }

    /// Reads every bucket overlapping the range, in parallel. Corrupt buckets
    /// are logged and skipped.
    fn load(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Document>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        let buckets: Vec<(&BucketResolver, NaiveDate)> = self
            .resolvers
            .iter()
            .flat_map(|resolver| {
                resolver
                    .existing(start, end)
                    .into_iter()
                    .map(move |period| (resolver, period))
            })
            .collect();
        tracing::debug!(kind = %R::KIND, buckets = buckets.len(), %start, %end, "querying");

        let documents = buckets
            .par_iter()
            .map(|(resolver, period)| match resolver.read(*period) {
                Ok(document) => Ok(Some(document)),
                Err(StoreError::CorruptData { path, reason }) => {
                    tracing::warn!(path = ?path, reason = %reason, "skipping corrupt bucket");
                    Ok(None)
                }
                Err(e) => Err(e),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents.into_iter().flatten().collect())
    }
}

/// Missing roots compare by their literal path.
fn canonical_root(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

fn in_range<R: Record>(
    document: &Document,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = &DateList<R>> {
    R::section(document)
        .iter()
        .filter(move |list| start <= list.date && list.date <= end)
}
