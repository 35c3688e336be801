//! Query command for aggregating usage over a date range.
//!
//! Prints either an aligned human-readable table or JSON rows.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use ustats_core::Kind;
use ustats_store::Aggregate;

use super::util::format_duration;
use crate::Config;

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    kind: Kind,
    start: NaiveDate,
    end: NaiveDate,
    json: bool,
) -> Result<()> {
    if start > end {
        tracing::warn!(%start, %end, "start is after end; the result is empty");
    }
    let aggregate = config.tracker().query(kind, start, end)?;
    tracing::debug!(%kind, %start, %end, keys = aggregate.len(), "queried usage");

    if json {
        writeln!(writer, "{}", format_json(kind, start, end, &aggregate)?)?;
    } else {
        write!(writer, "{}", format_human(kind, start, end, &aggregate))?;
    }
    Ok(())
}

// ========== Human Output ==========

/// Renders the aggregate as a table, largest values first.
pub fn format_human(kind: Kind, start: NaiveDate, end: NaiveDate, aggregate: &Aggregate) -> String {
    let mut out = if start == end {
        format!("{kind} usage on {start}\n")
    } else {
        format!("{kind} usage from {start} to {end}\n")
    };

    if aggregate.is_empty() {
        out.push_str("No usage recorded.\n");
        return out;
    }

    let rows: Vec<(String, String)> = match aggregate {
        Aggregate::Durations(map) => by_value_desc(map.iter().map(|(k, v)| (k.clone(), *v)))
            .into_iter()
            .map(|(key, ms)| (key, format_duration(ms)))
            .collect(),
        Aggregate::Counts(map) => by_value_desc(map.iter().map(|(k, v)| (k.clone(), *v)))
            .into_iter()
            .map(|(key, count)| (key, count.to_string()))
            .collect(),
        Aggregate::Launches(map) => map
            .iter()
            .map(|(key, totals)| {
                (
                    key.to_string(),
                    format!(
                        "{} runs, {}, {} files",
                        totals.count,
                        format_duration(totals.total_duration_ms),
                        totals.file_ids.len()
                    ),
                )
            })
            .collect(),
        Aggregate::Sessions(map) => map
            .iter()
            .map(|(date, ms)| (date.to_string(), format_duration(*ms)))
            .collect(),
    };

    let width = rows.iter().map(|(key, _)| key.chars().count()).max().unwrap_or(0);
    for (key, value) in rows {
        out.push_str(&format!("  {key:<width$}  {value}\n"));
    }
    out
}

fn by_value_desc(entries: impl Iterator<Item = (String, u64)>) -> Vec<(String, u64)> {
    let mut rows: Vec<_> = entries.collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
struct JsonQuery<T> {
    kind: Kind,
    start: NaiveDate,
    end: NaiveDate,
    rows: Vec<T>,
}

#[derive(Debug, Serialize)]
struct DurationRow<'a> {
    id: &'a str,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct CountRow<'a> {
    id: &'a str,
    count: u64,
}

#[derive(Debug, Serialize)]
struct LaunchRow<'a> {
    name: &'a str,
    launch_type_id: &'a str,
    launch_mode_id: &'a str,
    count: u64,
    total_duration_ms: u64,
    file_ids: &'a BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct SessionRow {
    date: NaiveDate,
    duration_ms: u64,
}

/// Renders the aggregate as pretty-printed JSON rows in key order.
pub fn format_json(
    kind: Kind,
    start: NaiveDate,
    end: NaiveDate,
    aggregate: &Aggregate,
) -> Result<String> {
    fn render<T: Serialize>(
        kind: Kind,
        start: NaiveDate,
        end: NaiveDate,
        rows: Vec<T>,
    ) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonQuery {
            kind,
            start,
            end,
            rows,
        })?)
    }

    match aggregate {
        Aggregate::Durations(map) => render(
            kind,
            start,
            end,
            map.iter()
                .map(|(id, ms)| DurationRow {
                    id,
                    duration_ms: *ms,
                })
                .collect(),
        ),
        Aggregate::Counts(map) => render(
            kind,
            start,
            end,
            map.iter()
                .map(|(id, count)| CountRow { id, count: *count })
                .collect(),
        ),
        Aggregate::Launches(map) => render(
            kind,
            start,
            end,
            map.iter()
                .map(|(key, totals)| LaunchRow {
                    name: &key.name,
                    launch_type_id: &key.launch_type_id,
                    launch_mode_id: &key.launch_mode_id,
                    count: totals.count,
                    total_duration_ms: totals.total_duration_ms,
                    file_ids: &totals.file_ids,
                })
                .collect(),
        ),
        Aggregate::Sessions(map) => render(
            kind,
            start,
            end,
            map.iter()
                .map(|(date, ms)| SessionRow {
                    date: *date,
                    duration_ms: *ms,
                })
                .collect(),
        ),
    }
}
