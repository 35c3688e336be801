//! Identity comparison and additive combination of records.

use thiserror::Error;

use crate::kind::Kind;
use crate::record::Record;

/// Merge errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// `merge` was called on two records with different identities.
    ///
    /// This is a caller bug; [`merge_into`] never produces it.
    #[error("cannot merge {kind} records with different identities")]
    IdentityMismatch { kind: Kind },
}

/// Whether `a` and `b` denote the same thing. Looks at identity fields only.
pub fn is_mergeable<R: Record>(a: &R, b: &R) -> bool {
    a.identity() == b.identity()
}

/// Combines two same-identity records into a new one.
///
/// Neither input is modified.
pub fn merge<R: Record>(a: &R, b: &R) -> Result<R, MergeError> {
    if !is_mergeable(a, b) {
        return Err(MergeError::IdentityMismatch { kind: R::KIND });
    }
    Ok(a.combine(b))
}

/// Merges `record` into the first record of equal identity, or appends it.
pub fn merge_into<R: Record>(records: &mut Vec<R>, record: R) {
    match records.iter_mut().find(|existing| is_mergeable(&**existing, &record)) {
        Some(existing) => *existing = existing.combine(&record),
        None => records.push(record),
    }
}
