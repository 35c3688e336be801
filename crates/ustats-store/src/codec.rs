//! Bucket file encoding and atomic replacement.
//!
//! A bucket is pretty-printed JSON:
//!
//! ```text
//! $ cat command-2024-03.json
//! {
//!   "schema_version": 1,
//!   "command_events": [
//!     { "date": "2024-03-05", "records": [{ "command_id": "cmd.save", "count": 2 }] }
//!   ]
//! }
//! ```

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ustats_core::{Document, SCHEMA_VERSION};

use crate::StoreError;

const MAX_BACKUPS: u32 = 1000;

/// Reads the bucket at `path`.
///
/// A missing file is not an error and yields an empty document. A file that
/// exists but does not parse yields [`StoreError::CorruptData`]; its bytes are
/// left as they are.
pub fn read(path: &Path) -> Result<Document, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::trace!(path = ?path, "bucket does not exist yet");
            return Ok(Document::default());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if bytes.is_empty() {
        return Err(corrupt(path, "file is empty"));
    }

    let mut document: Document =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(path, e.to_string()))?;

    if let Some((kind, date)) = document.duplicate_date() {
        return Err(corrupt(path, format!("{kind} events list {date} more than once")));
    }

    if document.schema_version > SCHEMA_VERSION {
        tracing::warn!(
            path = ?path,
            version = document.schema_version,
            supported = SCHEMA_VERSION,
            "bucket written by a newer version; unknown fields are ignored"
        );
    }

    document.sort();
    Ok(document)
}

/// Reads the bucket at `path` covering the inclusive `period`.
///
/// Like [`read`], and additionally a day list dated outside the period is
/// [`StoreError::CorruptData`].
pub fn read_period(path: &Path, period: (NaiveDate, NaiveDate)) -> Result<Document, StoreError> {
    let document = read(path)?;
    let (first, last) = period;
    if let Some((kind, date)) = document.date_outside(first, last) {
        return Err(corrupt(
            path,
            format!("{kind} events list {date}, outside the bucket period {first}..{last}"),
        ));
    }
    Ok(document)
}

/// Replaces the bucket at `path` with `document`.
///
/// Writes to a `.tmp` sibling first, syncs, then renames over the final path,
/// so readers see either the old or the new file and never a partial one.
pub fn write(document: &Document, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let json = serde_json::to_vec_pretty(document)?;
    let tmp_path = sibling(path, "tmp");

    let result = write_synced(&tmp_path, &json).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Copies the bytes of a corrupt bucket aside and returns the copy's path.
///
/// The first copy is `<path>.corrupt`, later ones `<path>.corrupt.1`,
/// `<path>.corrupt.2`, ... An existing copy is never overwritten.
pub fn preserve(path: &Path) -> Result<PathBuf, StoreError> {
    let mut source = File::open(path).map_err(|e| StoreError::io(path, e))?;
    for n in 0..MAX_BACKUPS {
        let backup = if n == 0 {
            sibling(path, "corrupt")
        } else {
            sibling(path, &format!("corrupt.{n}"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&backup) {
            Ok(mut file) => {
                io::copy(&mut source, &mut file)
                    .and_then(|_| file.sync_data())
                    .map_err(|e| StoreError::io(&backup, e))?;
                return Ok(backup);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(StoreError::io(&backup, e)),
        }
    }
    Err(StoreError::io(
        path,
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{MAX_BACKUPS} corrupt backups already exist"),
        ),
    ))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_data())
        .map_err(|e| StoreError::io(path, e))
}

/// `<path>.<suffix>`, keeping the original extension.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn corrupt(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::CorruptData {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
