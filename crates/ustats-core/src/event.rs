//! Usage events delivered by producers.

use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::types::{ValidationError, require_non_empty};

/// A single observation of usage, attributed to an identity at a point in time.
///
/// Serialized as one flat JSON object, e.g.
/// `{"timestamp":"2024-03-05T09:00:00+01:00","kind":"command","command_id":"cmd.save","count":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the usage happened. The local calendar day decides the bucket.
    pub timestamp: DateTime<Local>,
    /// What was used, and how much.
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// The kind-specific part of a [`UsageEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// Time spent in a file.
    File { path: String, duration_ms: u64 },
    /// Command executions.
    Command {
        command_id: String,
        #[serde(default = "one")]
        count: u64,
    },
    /// Time a perspective was active.
    Perspective { id: String, duration_ms: u64 },
    /// Time a workbench part had focus.
    Part { id: String, duration_ms: u64 },
    /// One run of a launch configuration.
    Launch {
        name: String,
        launch_type_id: String,
        launch_mode_id: String,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        file_ids: BTreeSet<String>,
    },
    /// Active working time.
    Session { duration_ms: u64 },
}

const fn one() -> u64 {
    1
}

impl UsageEvent {
    /// Time spent in the file at `path`.
    pub fn file(path: impl Into<String>, duration_ms: u64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            payload: EventPayload::File {
                path: path.into(),
                duration_ms,
            },
        }
    }

    /// A single execution of `command_id`.
    pub fn command(command_id: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            payload: EventPayload::Command {
                command_id: command_id.into(),
                count: 1,
            },
        }
    }

    /// Time a perspective was active.
    pub fn perspective(id: impl Into<String>, duration_ms: u64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            payload: EventPayload::Perspective {
                id: id.into(),
                duration_ms,
            },
        }
    }

    /// Time a workbench part had focus.
    pub fn part(id: impl Into<String>, duration_ms: u64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            payload: EventPayload::Part {
                id: id.into(),
                duration_ms,
            },
        }
    }

    /// One run of a launch configuration.
    pub fn launch(
        name: impl Into<String>,
        launch_type_id: impl Into<String>,
        launch_mode_id: impl Into<String>,
        duration_ms: u64,
        file_ids: BTreeSet<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp,
            payload: EventPayload::Launch {
                name: name.into(),
                launch_type_id: launch_type_id.into(),
                launch_mode_id: launch_mode_id.into(),
                duration_ms,
                file_ids,
            },
        }
    }

    /// A stretch of active working time starting at `timestamp`.
    pub fn session(duration_ms: u64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            payload: EventPayload::Session { duration_ms },
        }
    }

    /// Overrides the command count.
    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        if let EventPayload::Command { count: c, .. } = &mut self.payload {
            *c = count;
        }
        self
    }

    /// The kind of store this event belongs to.
    pub const fn kind(&self) -> Kind {
        match self.payload {
            EventPayload::File { .. } => Kind::File,
            EventPayload::Command { .. } => Kind::Command,
            EventPayload::Perspective { .. } => Kind::Perspective,
            EventPayload::Part { .. } => Kind::Part,
            EventPayload::Launch { .. } => Kind::Launch,
            EventPayload::Session { .. } => Kind::Session,
        }
    }

    /// The local calendar day of the event.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Rejects events whose identity fields are empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.payload {
            EventPayload::File { path, .. } => require_non_empty("file path", path),
            EventPayload::Command { command_id, .. } => require_non_empty("command ID", command_id),
            EventPayload::Perspective { id, .. } => require_non_empty("perspective ID", id),
            EventPayload::Part { id, .. } => require_non_empty("part ID", id),
            EventPayload::Launch {
                name,
                launch_type_id,
                launch_mode_id,
                ..
            } => {
                require_non_empty("launch name", name)?;
                require_non_empty("launch type ID", launch_type_id)?;
                require_non_empty("launch mode ID", launch_mode_id)
            }
            EventPayload::Session { .. } => Ok(()),
        }
    }
}
