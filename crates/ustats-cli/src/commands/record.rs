//! Record command: emit one event and write it out immediately.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use ustats_core::UsageEvent;

use crate::{Config, RecordEvent};

/// Builds the usage event described on the command line.
pub fn build_event(event: &RecordEvent, timestamp: DateTime<Local>) -> UsageEvent {
    match event {
        RecordEvent::File { path, duration_ms } => UsageEvent::file(path, *duration_ms, timestamp),
        RecordEvent::Command { command_id, count } => {
            UsageEvent::command(command_id, timestamp).with_count(*count)
        }
        RecordEvent::Perspective { id, duration_ms } => {
            UsageEvent::perspective(id, *duration_ms, timestamp)
        }
        RecordEvent::Part { id, duration_ms } => UsageEvent::part(id, *duration_ms, timestamp),
        RecordEvent::Launch {
            name,
            launch_type_id,
            launch_mode_id,
            duration_ms,
            files,
        } => UsageEvent::launch(
            name,
            launch_type_id,
            launch_mode_id,
            *duration_ms,
            files.iter().cloned().collect(),
            timestamp,
        ),
        RecordEvent::Session { duration_ms } => UsageEvent::session(*duration_ms, timestamp),
    }
}

pub fn run<W: Write>(writer: &mut W, config: &Config, event: &UsageEvent) -> Result<()> {
    let mut tracker = config.tracker();
    tracker.emit(event).context("event rejected")?;
    tracker.flush().with_context(|| {
        format!(
            "failed to write usage data under {}",
            config.storage_root.display()
        )
    })?;

    tracing::info!(kind = %event.kind(), date = %event.date(), "recorded event");
    writeln!(writer, "Recorded {} usage on {}", event.kind(), event.date())?;
    Ok(())
}
