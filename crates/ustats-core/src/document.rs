//! In-memory form of one bucket file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::merge::merge_into;
use crate::record::{
    CommandRecord, DateList, FileRecord, LaunchRecord, PartRecord, PerspectiveRecord, Record,
    SessionRecord,
};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

const fn current_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A bucket document: per kind, the day lists recorded in one period.
///
/// Sections are kept sorted by date. Missing sections deserialize as empty,
/// and empty sections are omitted when serializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_events: Vec<DateList<FileRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_events: Vec<DateList<CommandRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub perspective_events: Vec<DateList<PerspectiveRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part_events: Vec<DateList<PartRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub launch_events: Vec<DateList<LaunchRecord>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_events: Vec<DateList<SessionRecord>>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            file_events: Vec::new(),
            command_events: Vec::new(),
            perspective_events: Vec::new(),
            part_events: Vec::new(),
            launch_events: Vec::new(),
            session_events: Vec::new(),
        }
    }
}

impl Document {
    /// True when no kind has any day list.
    pub fn is_empty(&self) -> bool {
        self.file_events.is_empty()
            && self.command_events.is_empty()
            && self.perspective_events.is_empty()
            && self.part_events.is_empty()
            && self.launch_events.is_empty()
            && self.session_events.is_empty()
    }

    /// Day lists of kind `R`, chronologically.
    pub fn date_lists<R: Record>(&self) -> &[DateList<R>] {
        R::section(self)
    }

    /// Finds the day list for `date`, creating it in date order if absent.
    pub fn date_list_mut<R: Record>(&mut self, date: NaiveDate) -> &mut DateList<R> {
        let section = R::section_mut(self);
        let index = match section.binary_search_by_key(&date, |list| list.date) {
            Ok(index) => index,
            Err(index) => {
                section.insert(index, DateList::new(date));
                index
            }
        };
        &mut section[index]
    }

    /// Merges `record` into the day list for `date`.
    pub fn insert<R: Record>(&mut self, date: NaiveDate, record: R) {
        merge_into(&mut self.date_list_mut(date).records, record);
    }

    /// Finds a date that appears in more than one day list of a section.
    pub fn duplicate_date(&self) -> Option<(Kind, NaiveDate)> {
        fn check<R: Record>(document: &Document) -> Option<(Kind, NaiveDate)> {
            let mut dates: Vec<NaiveDate> = R::section(document).iter().map(|l| l.date).collect();
            dates.sort_unstable();
            dates
                .windows(2)
                .find(|pair| pair[0] == pair[1])
                .map(|pair| (R::KIND, pair[0]))
        }

        check::<FileRecord>(self)
            .or_else(|| check::<CommandRecord>(self))
            .or_else(|| check::<PerspectiveRecord>(self))
            .or_else(|| check::<PartRecord>(self))
            .or_else(|| check::<LaunchRecord>(self))
            .or_else(|| check::<SessionRecord>(self))
    }

    /// Finds a day list dated outside `[first, last]`.
    pub fn date_outside(&self, first: NaiveDate, last: NaiveDate) -> Option<(Kind, NaiveDate)> {
        fn check<R: Record>(
            document: &Document,
            first: NaiveDate,
            last: NaiveDate,
        ) -> Option<(Kind, NaiveDate)> {
            R::section(document)
                .iter()
                .map(|l| l.date)
                .find(|date| *date < first || *date > last)
                .map(|date| (R::KIND, date))
        }

        check::<FileRecord>(self, first, last)
            .or_else(|| check::<CommandRecord>(self, first, last))
            .or_else(|| check::<PerspectiveRecord>(self, first, last))
            .or_else(|| check::<PartRecord>(self, first, last))
            .or_else(|| check::<LaunchRecord>(self, first, last))
            .or_else(|| check::<SessionRecord>(self, first, last))
    }

    /// Restores date order in every section.
    ///
    /// Hand-edited files may list days out of order; lookups rely on sorting.
    pub fn sort(&mut self) {
        fn sort_section<R: Record>(document: &mut Document) {
            R::section_mut(document).sort_by_key(|list| list.date);
        }

        sort_section::<FileRecord>(self);
        sort_section::<CommandRecord>(self);
        sort_section::<PerspectiveRecord>(self);
        sort_section::<PartRecord>(self);
        sort_section::<LaunchRecord>(self);
        sort_section::<SessionRecord>(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn command(id: &str, count: u64) -> CommandRecord {
        CommandRecord {
            command_id: id.to_string(),
            count,
        }
    }

    #[test]
    fn default_document_is_empty_and_versioned() {
        let document = Document::default();
        assert!(document.is_empty());
        assert_eq!(document.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn date_lists_stay_sorted() {
        let mut document = Document::default();
        document.insert(day(9), command("a", 1));
        document.insert(day(2), command("a", 1));
        document.insert(day(5), command("a", 1));

        let dates: Vec<_> = document
            .date_lists::<CommandRecord>()
            .iter()
            .map(|l| l.date)
            .collect();
        assert_eq!(dates, vec![day(2), day(5), day(9)]);
    }

    #[test]
    fn insert_merges_same_day_same_identity() {
        let mut document = Document::default();
        document.insert(day(2), command("cmd.save", 1));
        document.insert(day(2), command("cmd.save", 1));
        document.insert(day(2), command("cmd.copy", 1));

        let lists = document.date_lists::<CommandRecord>();
        assert_eq!(lists.len(), 1);
        assert_eq!(
            lists[0].records,
            vec![command("cmd.save", 2), command("cmd.copy", 1)]
        );
    }

    #[test]
    fn sections_are_independent() {
        let mut document = Document::default();
        document.insert(day(2), command("cmd.save", 1));
        assert!(document.date_lists::<FileRecord>().is_empty());
        assert!(!document.is_empty());
    }

    #[test]
    fn duplicate_dates_are_detected() {
        let mut document = Document::default();
        document.command_events.push(DateList::new(day(3)));
        assert_eq!(document.duplicate_date(), None);
        document.command_events.push(DateList::new(day(3)));
        assert_eq!(document.duplicate_date(), Some((Kind::Command, day(3))));
    }

    #[test]
    fn dates_outside_period_are_detected() {
        let mut document = Document::default();
        document.insert(day(3), command("a", 1));
        assert_eq!(document.date_outside(day(1), day(31)), None);

        let may = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        document.insert(may, command("a", 1));
        assert_eq!(
            document.date_outside(day(1), day(31)),
            Some((Kind::Command, may))
        );
    }

    #[test]
    fn day_list_without_records_deserializes_empty() {
        let document: Document =
            serde_json::from_str(r#"{"file_events":[{"date":"2024-03-02"}]}"#).unwrap();
        assert_eq!(document.file_events.len(), 1);
        assert!(document.file_events[0].records.is_empty());
    }

    #[test]
    fn missing_sections_deserialize_empty() {
        let document: Document = serde_json::from_str(
            r#"{"command_events":[{"date":"2024-03-02","records":[{"command_id":"x","count":3}]}]}"#,
        )
        .unwrap();
        assert_eq!(document.schema_version, SCHEMA_VERSION);
        assert!(document.file_events.is_empty());
        assert_eq!(document.command_events[0].records[0].count, 3);
    }

    #[test]
    fn empty_sections_are_not_serialized() {
        let mut document = Document::default();
        document.insert(day(2), command("cmd.save", 1));
        let json = serde_json::to_string(&document).unwrap();
        insta::assert_snapshot!(json, @r#"{"schema_version":1,"command_events":[{"date":"2024-03-02","records":[{"command_id":"cmd.save","count":1}]}]}"#);
    }
}
