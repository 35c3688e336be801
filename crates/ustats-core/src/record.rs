//! Per-kind record shapes and the capability trait the storage engines are
//! generic over.
//!
//! Every kind differs only in how identity, measure and aggregation key are
//! pulled out of a record and in how two records combine. [`Record`] captures
//! exactly that, so the merger, the storer and the accessor are each written
//! once.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::event::{EventPayload, UsageEvent};
use crate::kind::Kind;

/// Per-kind capability table.
pub trait Record:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The kind this record shape belongs to.
    const KIND: Kind;

    /// Fields that decide whether two records denote the same thing.
    type Identity<'a>: PartialEq
    where
        Self: 'a;

    /// Key the accessor aggregates under.
    type Key: Ord + Clone + fmt::Debug + Send;

    /// Value the accessor sums per key.
    type Measure: Measure;

    /// Borrows the identity fields.
    fn identity(&self) -> Self::Identity<'_>;

    /// Aggregation key for this record found on `date`.
    fn key(&self, date: NaiveDate) -> Self::Key;

    /// The additive part of this record.
    fn measure(&self) -> Self::Measure;

    /// Combines two records of equal identity without touching either.
    ///
    /// Callers check identity first; see [`crate::merge`].
    fn combine(&self, other: &Self) -> Self;

    /// Converts a producer event, or `None` when the event is another kind.
    fn from_event(event: &UsageEvent) -> Option<Self>;

    /// This kind's section of a bucket document.
    fn section(document: &Document) -> &[DateList<Self>];

    /// Mutable access to this kind's section of a bucket document.
    fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>>;
}

/// An additive aggregate.
pub trait Measure: Default + Clone + fmt::Debug + PartialEq + Send {
    /// Folds `other` into `self`. Never decreases any component.
    fn accumulate(&mut self, other: Self);
}

impl Measure for u64 {
    fn accumulate(&mut self, other: Self) {
        *self = self.saturating_add(other);
    }
}

/// The records of one kind recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateList<R> {
    pub date: NaiveDate,
    #[serde(default = "Vec::new")]
    pub records: Vec<R>,
}

impl<R> DateList<R> {
    /// Creates an empty list for `date`.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            records: Vec::new(),
        }
    }
}

/// Time spent with a file open in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_path: String,
    #[serde(default)]
    pub duration_ms: u64,
    /// Epoch milliseconds of the earliest event merged into this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

impl Record for FileRecord {
    const KIND: Kind = Kind::File;
    type Identity<'a> = &'a str;
    type Key = String;
    type Measure = u64;

    fn identity(&self) -> Self::Identity<'_> {
        &self.file_path
    }

    fn key(&self, _date: NaiveDate) -> Self::Key {
        self.file_path.clone()
    }

    fn measure(&self) -> Self::Measure {
        self.duration_ms
    }

    fn combine(&self, other: &Self) -> Self {
        let start_time = match (self.start_time, other.start_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            file_path: self.file_path.clone(),
            duration_ms: self.duration_ms.saturating_add(other.duration_ms),
            start_time,
        }
    }

    fn from_event(event: &UsageEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::File { path, duration_ms } => Some(Self {
                file_path: path.clone(),
                duration_ms: *duration_ms,
                start_time: Some(event.timestamp.timestamp_millis()),
            }),
            _ => None,
        }
    }

    fn section(document: &Document) -> &[DateList<Self>] {
        &document.file_events
    }

    fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>> {
        &mut document.file_events
    }
}

/// Number of times a command was executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command_id: String,
    #[serde(default)]
    pub count: u64,
}

impl Record for CommandRecord {
    const KIND: Kind = Kind::Command;
    type Identity<'a> = &'a str;
    type Key = String;
    type Measure = u64;

    fn identity(&self) -> Self::Identity<'_> {
        &self.command_id
    }

    fn key(&self, _date: NaiveDate) -> Self::Key {
        self.command_id.clone()
    }

    fn measure(&self) -> Self::Measure {
        self.count
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            command_id: self.command_id.clone(),
            count: self.count.saturating_add(other.count),
        }
    }

    fn from_event(event: &UsageEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Command { command_id, count } => Some(Self {
                command_id: command_id.clone(),
                count: *count,
            }),
            _ => None,
        }
    }

    fn section(document: &Document) -> &[DateList<Self>] {
        &document.command_events
    }

    fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>> {
        &mut document.command_events
    }
}

/// Generates an `{id, duration_ms}` record for a workbench element kind.
macro_rules! define_duration_record {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:expr, $variant:ident, $section:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            #[serde(default)]
            pub duration_ms: u64,
        }

        impl Record for $name {
            const KIND: Kind = $kind;
            type Identity<'a> = &'a str;
            type Key = String;
            type Measure = u64;

            fn identity(&self) -> Self::Identity<'_> {
                &self.id
            }

            fn key(&self, _date: NaiveDate) -> Self::Key {
                self.id.clone()
            }

            fn measure(&self) -> Self::Measure {
                self.duration_ms
            }

            fn combine(&self, other: &Self) -> Self {
                Self {
                    id: self.id.clone(),
                    duration_ms: self.duration_ms.saturating_add(other.duration_ms),
                }
            }

            fn from_event(event: &UsageEvent) -> Option<Self> {
                match &event.payload {
                    EventPayload::$variant { id, duration_ms } => Some(Self {
                        id: id.clone(),
                        duration_ms: *duration_ms,
                    }),
                    _ => None,
                }
            }

            fn section(document: &Document) -> &[DateList<Self>] {
                &document.$section
            }

            fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>> {
                &mut document.$section
            }
        }
    };
}

define_duration_record!(
    /// Time a perspective was active.
    PerspectiveRecord, Kind::Perspective, Perspective, perspective_events
);

define_duration_record!(
    /// Time a workbench part (view or editor) had focus.
    PartRecord, Kind::Part, Part, part_events
);

/// Identity of a launch configuration run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LaunchKey {
    pub name: String,
    pub launch_type_id: String,
    pub launch_mode_id: String,
}

impl fmt::Display for LaunchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.name, self.launch_type_id, self.launch_mode_id
        )
    }
}

/// Summed launch statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaunchTotals {
    pub count: u64,
    pub total_duration_ms: u64,
    pub file_ids: BTreeSet<String>,
}

impl Measure for LaunchTotals {
    fn accumulate(&mut self, other: Self) {
        self.count = self.count.saturating_add(other.count);
        self.total_duration_ms = self.total_duration_ms.saturating_add(other.total_duration_ms);
        self.file_ids.extend(other.file_ids);
    }
}

/// Runs of a launch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub name: String,
    pub launch_type_id: String,
    pub launch_mode_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_duration_ms: u64,
    /// Files touched while the launch was running.
    #[serde(default)]
    pub file_ids: BTreeSet<String>,
}

impl Record for LaunchRecord {
    const KIND: Kind = Kind::Launch;
    type Identity<'a> = (&'a str, &'a str, &'a str);
    type Key = LaunchKey;
    type Measure = LaunchTotals;

    fn identity(&self) -> Self::Identity<'_> {
        (&self.name, &self.launch_type_id, &self.launch_mode_id)
    }

    fn key(&self, _date: NaiveDate) -> Self::Key {
        LaunchKey {
            name: self.name.clone(),
            launch_type_id: self.launch_type_id.clone(),
            launch_mode_id: self.launch_mode_id.clone(),
        }
    }

    fn measure(&self) -> Self::Measure {
        LaunchTotals {
            count: self.count,
            total_duration_ms: self.total_duration_ms,
            file_ids: self.file_ids.clone(),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        Self {
            name: self.name.clone(),
            launch_type_id: self.launch_type_id.clone(),
            launch_mode_id: self.launch_mode_id.clone(),
            count: self.count.saturating_add(other.count),
            total_duration_ms: self.total_duration_ms.saturating_add(other.total_duration_ms),
            file_ids: self.file_ids.union(&other.file_ids).cloned().collect(),
        }
    }

    fn from_event(event: &UsageEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Launch {
                name,
                launch_type_id,
                launch_mode_id,
                duration_ms,
                file_ids,
            } => Some(Self {
                name: name.clone(),
                launch_type_id: launch_type_id.clone(),
                launch_mode_id: launch_mode_id.clone(),
                count: 1,
                total_duration_ms: *duration_ms,
                file_ids: file_ids.clone(),
            }),
            _ => None,
        }
    }

    fn section(document: &Document) -> &[DateList<Self>] {
        &document.launch_events
    }

    fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>> {
        &mut document.launch_events
    }
}

/// One contiguous stretch of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Epoch milliseconds.
    pub start_time: i64,
    pub duration_ms: u64,
}

/// Active working time for a day.
///
/// All session records of one day share an identity, so a day holds at most
/// one after merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

impl Record for SessionRecord {
    const KIND: Kind = Kind::Session;
    type Identity<'a> = ();
    type Key = NaiveDate;
    type Measure = u64;

    fn identity(&self) -> Self::Identity<'_> {}

    fn key(&self, date: NaiveDate) -> Self::Key {
        date
    }

    fn measure(&self) -> Self::Measure {
        self.duration_ms
    }

    fn combine(&self, other: &Self) -> Self {
        let mut intervals = Vec::with_capacity(self.intervals.len() + other.intervals.len());
        intervals.extend_from_slice(&self.intervals);
        intervals.extend_from_slice(&other.intervals);
        Self {
            duration_ms: self.duration_ms.saturating_add(other.duration_ms),
            intervals,
        }
    }

    fn from_event(event: &UsageEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Session { duration_ms } => Some(Self {
                duration_ms: *duration_ms,
                intervals: vec![Interval {
                    start_time: event.timestamp.timestamp_millis(),
                    duration_ms: *duration_ms,
                }],
            }),
            _ => None,
        }
    }

    fn section(document: &Document) -> &[DateList<Self>] {
        &document.session_events
    }

    fn section_mut(document: &mut Document) -> &mut Vec<DateList<Self>> {
        &mut document.session_events
    }
}
