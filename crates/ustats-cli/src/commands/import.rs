//! Import command for feeding JSONL usage events into the store.

use std::io::BufRead;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use ustats_core::UsageEvent;
use ustats_store::{FlushWorker, Tracker};

use crate::Config;

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
}

/// Reads one event per line from `reader` and stores them.
///
/// Events are buffered in a tracker that a background worker flushes every
/// `flush_interval_secs`; whatever is left is flushed once input ends.
/// Malformed or invalid lines are logged and counted, not fatal.
pub fn run<R: BufRead>(reader: R, config: &Config) -> Result<ImportSummary> {
    let tracker = Arc::new(Mutex::new(config.tracker()));
    let worker = FlushWorker::spawn(Arc::clone(&tracker), config.flush_interval())
        .context("failed to start flush worker")?;

    let summary = import_events(reader, &tracker);
    worker.stop();

    let mut tracker = tracker.lock().unwrap_or_else(PoisonError::into_inner);
    tracker.flush().with_context(|| {
        format!(
            "failed to write usage data under {}",
            config.storage_root.display()
        )
    })?;

    let summary = summary?;
    tracing::info!(
        imported = summary.imported,
        rejected = summary.rejected,
        "import finished"
    );
    Ok(summary)
}

fn import_events<R: BufRead>(reader: R, tracker: &Mutex<Tracker>) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: UsageEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping malformed event");
                summary.rejected += 1;
                continue;
            }
        };

        let result = tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(&event);
        match result {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping invalid event");
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Cursor;

    use chrono::NaiveDate;
    use ustats_core::{Granularity, Kind};
    use ustats_store::Aggregate;

    use super::*;

    fn config(root: &std::path::Path) -> Config {
        Config {
            storage_root: root.to_path_buf(),
            granularity: Granularity::Month,
            flush_interval_secs: 30,
            extra_roots: Vec::new(),
        }
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn import_counts_and_stores_events() {
        let temp = tempfile::tempdir().unwrap();
        let config = config(temp.path());
        let input = r#"{"timestamp":"2024-03-05T09:00:00Z","kind":"file","path":"/p/a.txt","duration_ms":1000}
{"timestamp":"2024-03-05T10:00:00Z","kind":"file","path":"/p/a.txt","duration_ms":2000}

{"timestamp":"2024-03-06T10:00:00Z","kind":"command","command_id":"cmd.save"}
not json
{"timestamp":"2024-03-06T10:00:00Z","kind":"command","command_id":""}
{"timestamp":"2024-03-06T10:00:00Z","kind":"widget","id":"x"}
"#;

        let summary = run(Cursor::new(input), &config).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                imported: 3,
                rejected: 3
            }
        );

        let tracker = config.tracker();
        assert_eq!(
            tracker.query(Kind::File, day(3, 1), day(3, 31)).unwrap(),
            Aggregate::Durations(BTreeMap::from([("/p/a.txt".to_string(), 3000)]))
        );
        assert_eq!(
            tracker.query(Kind::Command, day(3, 1), day(3, 31)).unwrap(),
            Aggregate::Counts(BTreeMap::from([("cmd.save".to_string(), 1)]))
        );
    }

    #[test]
    fn import_of_empty_input_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("store");
        let summary = run(Cursor::new(""), &config(&root)).unwrap();
        assert_eq!(summary, ImportSummary::default());
        assert!(!root.exists());
    }

    #[test]
    fn import_reports_write_failure() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("session-2024-03.json")).unwrap();
        let input = r#"{"timestamp":"2024-03-05T09:00:00Z","kind":"session","duration_ms":60000}"#;

        let err = run(Cursor::new(input), &config(temp.path())).unwrap_err();
        assert!(format!("{err:#}").contains("failed to write usage data"), "{err:#}");
    }
}
