//! Record normalization
//!
//! The normalizer is the only place raw strings are parsed. It is a pure
//! transform from raw rows to a [`NormalizedBatch`]:
//!
//! - timestamps are parsed with the configured format; rows that fail are
//!   excluded from ALL downstream processing and counted, never surfaced as
//!   errors
//! - durations parse `H:MM:SS`, `MM:SS`, or plain seconds; anything else
//!   (including absence) becomes the explicit unknown state `None`
//! - agent names are trimmed and resolved through the alias table
//!
//! Each record keeps the index of its source row as its identity.

use crate::config::AliasTable;
use crate::record::{CallRecord, RawRecord};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// The output of one normalization pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBatch {
    /// Records with a valid start timestamp, in source order
    pub records: Vec<CallRecord>,
    /// Rows discarded for an unparseable start timestamp
    pub discarded: usize,
}

impl NormalizedBatch {
    /// Number of surviving records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record survived
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize raw rows into typed call records
///
/// Row indices (and therefore record identities) are assigned by enumeration
/// order of the input.
pub fn normalize(
    rows: impl IntoIterator<Item = RawRecord>,
    aliases: &AliasTable,
    timestamp_format: &str,
) -> NormalizedBatch {
    let mut records = Vec::new();
    let mut discarded = 0usize;

    for (source_row, row) in rows.into_iter().enumerate() {
        let start_time =
            match NaiveDateTime::parse_from_str(row.start_time.trim(), timestamp_format) {
                Ok(ts) => ts,
                Err(err) => {
                    debug!(
                        row = source_row,
                        value = %row.start_time,
                        %err,
                        "discarding row with unparseable start time"
                    );
                    discarded += 1;
                    continue;
                }
            };

        let raw_agent_name = row.agent_name.as_deref().unwrap_or("").trim().to_string();
        let agent_name = if raw_agent_name.is_empty() {
            String::new()
        } else {
            aliases.resolve(&raw_agent_name)
        };

        records.push(CallRecord::new(
            source_row,
            start_time,
            row.talk_time.as_deref().and_then(parse_duration),
            row.ring_time.as_deref().and_then(parse_duration),
            raw_agent_name,
            agent_name,
        ));
    }

    info!(
        records = records.len(),
        discarded, "normalized call record batch"
    );

    NormalizedBatch { records, discarded }
}

/// Parse an exported duration value
///
/// Accepts `H:MM:SS` (hours unbounded), `MM:SS`, and plain integer seconds.
/// Returns `None` for anything else; unknown is a real state downstream, so
/// there is no zero fallback here.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parts: Vec<&str> = value.split(':').collect();
    let seconds = match parts.as_slice() {
        [hours, minutes, seconds] => {
            let hours: u64 = hours.trim().parse().ok()?;
            let minutes: u64 = minutes.trim().parse().ok()?;
            let seconds: u64 = seconds.trim().parse().ok()?;
            if minutes >= 60 || seconds >= 60 {
                return None;
            }
            hours * 3600 + minutes * 60 + seconds
        }
        [minutes, seconds] => {
            let minutes: u64 = minutes.trim().parse().ok()?;
            let seconds: u64 = seconds.trim().parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            minutes * 60 + seconds
        }
        [seconds] => seconds.trim().parse().ok()?,
        _ => return None,
    };

    Some(Duration::from_secs(seconds))
}
