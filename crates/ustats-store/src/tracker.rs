//! One storer and accessor per kind, behind a single producer/consumer facade.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ustats_core::{
    CommandRecord, FileRecord, Granularity, Kind, LaunchKey, LaunchRecord, LaunchTotals,
    PartRecord, PerspectiveRecord, Record, SessionRecord, UsageEvent,
};

use crate::accessor::Accessor;
use crate::resolver::BucketResolver;
use crate::storer::Storer;
use crate::StoreError;

/// The result of a query, shaped by the kind that was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Milliseconds per identity (files, perspectives, parts).
    Durations(BTreeMap<String, u64>),
    /// Executions per command.
    Counts(BTreeMap<String, u64>),
    /// Launch statistics per launch configuration.
    Launches(BTreeMap<LaunchKey, LaunchTotals>),
    /// Active milliseconds per day.
    Sessions(BTreeMap<NaiveDate, u64>),
}

impl Aggregate {
    /// Number of keys in the aggregate.
    pub fn len(&self) -> usize {
        match self {
            Self::Durations(map) | Self::Counts(map) => map.len(),
            Self::Launches(map) => map.len(),
            Self::Sessions(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the storers for every kind under one storage root.
///
/// Not a global: construct one per storage root and hand it to whoever
/// produces or consumes events. Writes need `&mut`, so sharing across
/// threads goes through a `Mutex` (see [`crate::FlushWorker`]).
#[derive(Debug)]
pub struct Tracker {
    root: PathBuf,
    granularity: Granularity,
    extra_roots: Vec<PathBuf>,
    files: Storer<FileRecord>,
    commands: Storer<CommandRecord>,
    perspectives: Storer<PerspectiveRecord>,
    parts: Storer<PartRecord>,
    launches: Storer<LaunchRecord>,
    sessions: Storer<SessionRecord>,
}

impl Tracker {
    pub fn new(root: impl Into<PathBuf>, granularity: Granularity) -> Self {
        let root = root.into();
        Self {
            files: Storer::new(&root, granularity),
            commands: Storer::new(&root, granularity),
            perspectives: Storer::new(&root, granularity),
            parts: Storer::new(&root, granularity),
            launches: Storer::new(&root, granularity),
            sessions: Storer::new(&root, granularity),
            extra_roots: Vec::new(),
            granularity,
            root,
        }
    }

    /// Read-only roots whose buckets are included in queries.
    #[must_use]
    pub fn with_extra_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.extra_roots = roots;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn extra_roots(&self) -> &[PathBuf] {
        &self.extra_roots
    }

    /// Buffers `event` in the storer of its kind.
    pub fn emit(&mut self, event: &UsageEvent) -> Result<(), StoreError> {
        match event.kind() {
            Kind::File => self.files.insert(event),
            Kind::Command => self.commands.insert(event),
            Kind::Perspective => self.perspectives.insert(event),
            Kind::Part => self.parts.insert(event),
            Kind::Launch => self.launches.insert(event),
            Kind::Session => self.sessions.insert(event),
        }
    }

    /// Flushes every kind.
    ///
    /// A failing kind does not stop the others; the first error is returned
    /// and the failed records stay buffered.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let results = [
            self.files.flush(),
            self.commands.flush(),
            self.perspectives.flush(),
            self.parts.flush(),
            self.launches.flush(),
            self.sessions.flush(),
        ];
        results.into_iter().collect()
    }

    /// Records buffered across all kinds.
    pub fn pending(&self) -> usize {
        self.files.pending()
            + self.commands.pending()
            + self.perspectives.pending()
            + self.parts.pending()
            + self.launches.pending()
            + self.sessions.pending()
    }

    /// A typed accessor for kind `R` over the primary and extra roots.
    pub fn accessor<R: Record>(&self) -> Accessor<R> {
        Accessor::new(&self.root, self.granularity).with_extra_roots(self.extra_roots.iter())
    }

    /// Aggregates `kind` over `[start, end]`, inclusive. Reads only what
    /// has been flushed.
    pub fn query(
        &self,
        kind: Kind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Aggregate, StoreError> {
        Ok(match kind {
            Kind::File => Aggregate::Durations(self.accessor::<FileRecord>().query(start, end)?),
            Kind::Command => Aggregate::Counts(self.accessor::<CommandRecord>().query(start, end)?),
            Kind::Perspective => {
                Aggregate::Durations(self.accessor::<PerspectiveRecord>().query(start, end)?)
            }
            Kind::Part => Aggregate::Durations(self.accessor::<PartRecord>().query(start, end)?),
            Kind::Launch => {
                Aggregate::Launches(self.accessor::<LaunchRecord>().query(start, end)?)
            }
            Kind::Session => {
                Aggregate::Sessions(self.accessor::<SessionRecord>().query(start, end)?)
            }
        })
    }

    /// Bucket files of `kind` in the primary root.
    pub fn buckets(&self, kind: Kind) -> Result<Vec<PathBuf>, StoreError> {
        BucketResolver::new(&self.root, kind, self.granularity).all()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{DateTime, Local, TimeZone};

    use super::*;

    fn at(d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn emit_routes_by_kind() {
        let temp = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::new(temp.path(), Granularity::Month);
        tracker.emit(&UsageEvent::file("/a", 10, at(5))).unwrap();
        tracker.emit(&UsageEvent::command("cmd.save", at(5))).unwrap();
        tracker.emit(&UsageEvent::perspective("java", 20, at(5))).unwrap();
        assert_eq!(tracker.pending(), 3);

        tracker.flush().unwrap();
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.buckets(Kind::File).unwrap().len(), 1);
        assert_eq!(tracker.buckets(Kind::Command).unwrap().len(), 1);
        assert_eq!(tracker.buckets(Kind::Perspective).unwrap().len(), 1);
        assert!(tracker.buckets(Kind::Part).unwrap().is_empty());
    }

    #[test]
    fn query_returns_kind_shaped_aggregate() {
        let temp = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::new(temp.path(), Granularity::Month);
        tracker.emit(&UsageEvent::command("cmd.save", at(5))).unwrap();
        tracker.emit(&UsageEvent::session(1_000, at(6))).unwrap();
        tracker.flush().unwrap();

        assert_eq!(
            tracker.query(Kind::Command, day(1), day(31)).unwrap(),
            Aggregate::Counts(BTreeMap::from([("cmd.save".to_string(), 1)]))
        );
        assert_eq!(
            tracker.query(Kind::Session, day(1), day(31)).unwrap(),
            Aggregate::Sessions(BTreeMap::from([(day(6), 1_000)]))
        );
        let parts = tracker.query(Kind::Part, day(1), day(31)).unwrap();
        assert!(parts.is_empty());
        assert_eq!(parts, Aggregate::Durations(BTreeMap::new()));
    }

    #[test]
    fn unflushed_events_are_not_visible() {
        let temp = tempfile::tempdir().unwrap();
        let mut tracker = Tracker::new(temp.path(), Granularity::Month);
        tracker.emit(&UsageEvent::command("cmd.save", at(5))).unwrap();
        assert!(tracker.query(Kind::Command, day(5), day(5)).unwrap().is_empty());
        tracker.flush().unwrap();
        assert_eq!(tracker.query(Kind::Command, day(5), day(5)).unwrap().len(), 1);
    }

    #[test]
    fn failing_kind_does_not_block_others() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("file-2024-03.json")).unwrap();

        let mut tracker = Tracker::new(temp.path(), Granularity::Month);
        tracker.emit(&UsageEvent::file("/a", 10, at(5))).unwrap();
        tracker.emit(&UsageEvent::command("cmd.save", at(5))).unwrap();

        assert!(tracker.flush().is_err());
        assert_eq!(tracker.pending(), 1);
        assert_eq!(tracker.query(Kind::Command, day(5), day(5)).unwrap().len(), 1);

        fs::remove_dir(temp.path().join("file-2024-03.json")).unwrap();
        tracker.flush().unwrap();
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn queries_include_extra_roots() {
        let primary = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        {
            let mut tracker = Tracker::new(other.path(), Granularity::Month);
            tracker.emit(&UsageEvent::part("Outline", 500, at(5))).unwrap();
            tracker.flush().unwrap();
        }

        let tracker = Tracker::new(primary.path(), Granularity::Month)
            .with_extra_roots(vec![other.path().to_path_buf()]);
        assert_eq!(
            tracker.query(Kind::Part, day(1), day(31)).unwrap(),
            Aggregate::Durations(BTreeMap::from([("Outline".to_string(), 500)]))
        );
    }
}
