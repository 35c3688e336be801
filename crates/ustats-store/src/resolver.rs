//! Mapping from calendar days to bucket files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ustats_core::{Document, Granularity, Kind};

use crate::{StoreError, codec};

/// Resolves the bucket files of one kind under one storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketResolver {
    root: PathBuf,
    kind: Kind,
    granularity: Granularity,
}

impl BucketResolver {
    pub fn new(root: impl Into<PathBuf>, kind: Kind, granularity: Granularity) -> Self {
        Self {
            root: root.into(),
            kind,
            granularity,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }

    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Path of the bucket holding `date`. Pure; never touches the filesystem.
    pub fn resolve(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!(
            "{}-{}.json",
            self.kind,
            self.granularity.label(date)
        ))
    }

    /// Inclusive first and last day of the bucket holding `date`.
    pub fn period(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        self.granularity.period(date)
    }

    /// Existing bucket files whose period intersects `[start, end]`,
    /// chronologically. Empty when `start > end`.
    pub fn list(&self, start: NaiveDate, end: NaiveDate) -> Vec<PathBuf> {
        self.existing(start, end)
            .into_iter()
            .map(|period| self.resolve(period))
            .collect()
    }

    /// First days of the periods in `[start, end]` whose bucket file exists.
    pub fn existing(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.granularity
            .periods(start, end)
            .filter(|period| self.resolve(*period).is_file())
            .collect()
    }

    /// Reads the bucket holding `date`. A day list outside the bucket's
    /// period makes the bucket corrupt.
    pub fn read(&self, date: NaiveDate) -> Result<Document, StoreError> {
        codec::read_period(&self.resolve(date), self.period(date))
    }

    /// Every bucket file of this kind under the root, sorted by name.
    ///
    /// A missing root yields an empty list.
    pub fn all(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let prefix = format!("{}-", self.kind);
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(&prefix)
                        && Path::new(name)
                            .extension()
                            .is_some_and(|ext| ext == "json")
                });
            if matches && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn resolve_is_deterministic_and_pure() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = BucketResolver::new(temp.path(), Kind::Command, Granularity::Month);

        let a = resolver.resolve(day(2024, 3, 5));
        let b = resolver.resolve(day(2024, 3, 5));
        assert_eq!(a, b);
        assert_eq!(a, temp.path().join("command-2024-03.json"));
        assert_eq!(resolver.resolve(day(2024, 3, 31)), a);
        assert!(!a.exists());
    }

    #[test]
    fn kinds_get_separate_files() {
        let file = BucketResolver::new("/data", Kind::File, Granularity::Month);
        let part = BucketResolver::new("/data", Kind::Part, Granularity::Month);
        assert_ne!(
            file.resolve(day(2024, 3, 5)),
            part.resolve(day(2024, 3, 5))
        );
    }

    #[test]
    fn list_returns_only_existing_intersecting_buckets() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = BucketResolver::new(temp.path(), Kind::File, Granularity::Month);
        for date in [day(2024, 1, 1), day(2024, 3, 1), day(2024, 6, 1)] {
            fs::write(resolver.resolve(date), "{}").unwrap();
        }

        let listed = resolver.list(day(2024, 1, 31), day(2024, 4, 1));
        assert_eq!(
            listed,
            vec![
                temp.path().join("file-2024-01.json"),
                temp.path().join("file-2024-03.json")
            ]
        );
    }

    #[test]
    fn list_reversed_range_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = BucketResolver::new(temp.path(), Kind::File, Granularity::Month);
        fs::write(resolver.resolve(day(2024, 3, 1)), "{}").unwrap();
        assert!(resolver.list(day(2024, 3, 20), day(2024, 3, 1)).is_empty());
    }

    #[test]
    fn list_never_creates_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("missing");
        let resolver = BucketResolver::new(&root, Kind::File, Granularity::Week);
        assert!(resolver.list(day(2024, 1, 1), day(2024, 12, 31)).is_empty());
        assert!(!root.exists());
    }

    #[test]
    fn all_filters_by_kind() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["file-2024-01.json", "file-2024-02.json", "command-2024-01.json", "file-2024-02.json.tmp"] {
            fs::write(temp.path().join(name), "{}").unwrap();
        }
        let resolver = BucketResolver::new(temp.path(), Kind::File, Granularity::Month);
        let all = resolver.all().unwrap();
        assert_eq!(
            all,
            vec![
                temp.path().join("file-2024-01.json"),
                temp.path().join("file-2024-02.json")
            ]
        );
    }

    #[test]
    fn read_rejects_day_from_another_period() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = BucketResolver::new(temp.path(), Kind::Command, Granularity::Month);
        fs::write(
            resolver.resolve(day(2024, 3, 1)),
            r#"{"command_events":[{"date":"2024-03-31","records":[]},{"date":"2024-04-01","records":[]}]}"#,
        )
        .unwrap();

        assert!(resolver.read(day(2024, 3, 15)).unwrap_err().is_corrupt());
        assert!(resolver.read(day(2024, 4, 15)).unwrap().is_empty());
    }

    #[test]
    fn period_matches_granularity() {
        let resolver = BucketResolver::new("/data", Kind::Session, Granularity::Week);
        assert_eq!(
            resolver.period(day(2025, 1, 29)),
            (day(2025, 1, 27), day(2025, 2, 2))
        );
        assert_eq!(
            resolver.resolve(day(2025, 1, 29)),
            PathBuf::from("/data/session-2025-W05.json")
        );
    }
}
