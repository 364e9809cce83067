//! Core record types for the analytics pipeline
//!
//! A [`RawRecord`] is the untyped shape the engine accepts from whatever
//! front end loaded the export (CSV, spreadsheet, test fixture). The
//! normalizer turns raw rows into immutable [`CallRecord`]s with parsed
//! timestamps, canonical agent names, and the derived calendar fields every
//! downstream grouping needs.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One untyped input row, as extracted from the source file
///
/// Only `start_time` is required to be present; everything else may be
/// missing in real exports. Field values arrive as raw strings and are parsed
/// during normalization, never here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Call start timestamp, unparsed
    pub start_time: String,
    /// Talk duration, unparsed (e.g. "0:03:42")
    pub talk_time: Option<String>,
    /// Ring duration, unparsed
    pub ring_time: Option<String>,
    /// Agent name as exported, possibly an alias or empty
    pub agent_name: Option<String>,
    /// Call direction/type column, carried through untouched
    pub direction: Option<String>,
}

/// One normalized call record, immutable once produced
///
/// `talk_time`/`ring_time` use `None` as the explicit "unknown" state for
/// absent or unparseable durations. Unknown is non-comparable: it is distinct
/// from `Some(Duration::ZERO)` and never coerced to zero, because a coerced
/// zero would falsely classify the call as missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    /// Index of the source row this record came from. This is the record's
    /// identity: two records with identical field values are still distinct
    /// calls, and fan-out accounting keys on this, never on field equality.
    pub source_row: usize,
    /// Parsed call start timestamp
    pub start_time: NaiveDateTime,
    /// Talk duration; `None` means unknown (absent or unparseable)
    pub talk_time: Option<Duration>,
    /// Ring duration; `None` means unknown
    pub ring_time: Option<Duration>,
    /// Agent name as received, trimmed; may be empty
    pub raw_agent_name: String,
    /// Canonical agent name after alias resolution; empty means "no agent"
    pub agent_name: String,
    /// Calendar date of `start_time`
    pub date: NaiveDate,
    /// Hour of day, 0-23
    pub hour: u8,
    /// Weekday of `start_time`
    pub weekday: Weekday,
}

impl CallRecord {
    /// Build a record from parsed parts, computing the derived calendar fields
    pub fn new(
        source_row: usize,
        start_time: NaiveDateTime,
        talk_time: Option<Duration>,
        ring_time: Option<Duration>,
        raw_agent_name: String,
        agent_name: String,
    ) -> Self {
        Self {
            source_row,
            start_time,
            talk_time,
            ring_time,
            raw_agent_name,
            agent_name,
            date: start_time.date(),
            hour: start_time.hour() as u8,
            weekday: start_time.weekday(),
        }
    }

    /// Whether a (canonical) agent name is attached to this record
    pub fn has_agent(&self) -> bool {
        !self.agent_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_derived_fields() {
        // 2024-07-03 is a Wednesday
        let ts = NaiveDate::from_ymd_opt(2024, 7, 3)
            .unwrap()
            .and_hms_opt(13, 45, 12)
            .unwrap();
        let record = CallRecord::new(0, ts, Some(Duration::from_secs(90)), None, String::new(), String::new());

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(record.hour, 13);
        assert_eq!(record.weekday, Weekday::Wed);
        assert!(!record.has_agent());
    }

    #[test]
    fn test_unknown_duration_is_not_zero() {
        let ts = NaiveDate::from_ymd_opt(2024, 7, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let unknown = CallRecord::new(0, ts, None, None, String::new(), String::new());
        let zero = CallRecord::new(0, ts, Some(Duration::ZERO), None, String::new(), String::new());
        assert_ne!(unknown.talk_time, zero.talk_time);
    }
}
