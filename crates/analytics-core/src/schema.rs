//! Source schema binding
//!
//! Column names and ordering are environment-specific: every PBX export names
//! its columns differently, so the core never assumes a source schema. A
//! [`ColumnMap`] carries the configured header names, and [`ColumnMap::bind`]
//! resolves them against an actual header row, failing fast with every
//! missing required column named before any row is parsed.

use crate::error::{AnalyticsError, Result};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};

/// Configured header names for the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Header of the required call-start-timestamp column
    pub start_time: String,
    /// Header of the required talk-duration column
    pub talk_time: String,
    /// Header of the required agent-name column
    pub agent_name: String,
    /// Header of the optional ring-duration column
    pub ring_time: Option<String>,
    /// Header of the optional call-direction/type column
    pub direction: Option<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            start_time: "Call Start Time".to_string(),
            talk_time: "Talk Time".to_string(),
            agent_name: "Agent Name".to_string(),
            ring_time: Some("Ring Time".to_string()),
            direction: Some("Call Type".to_string()),
        }
    }
}

impl ColumnMap {
    /// Resolve the configured names against a header row
    ///
    /// Header matching is exact after trimming. All missing *required*
    /// columns are collected and reported together; a missing *optional*
    /// column simply leaves that field absent from every extracted record.
    pub fn bind(&self, headers: &[String]) -> Result<BoundColumns> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name.trim())
        };

        let start_time = position(&self.start_time);
        let talk_time = position(&self.talk_time);
        let agent_name = position(&self.agent_name);

        let mut missing = Vec::new();
        if start_time.is_none() {
            missing.push(self.start_time.clone());
        }
        if talk_time.is_none() {
            missing.push(self.talk_time.clone());
        }
        if agent_name.is_none() {
            missing.push(self.agent_name.clone());
        }
        if !missing.is_empty() {
            return Err(AnalyticsError::MissingColumns { columns: missing });
        }

        Ok(BoundColumns {
            start_time: start_time.unwrap(),
            talk_time: talk_time.unwrap(),
            agent_name: agent_name.unwrap(),
            ring_time: self.ring_time.as_deref().and_then(position),
            direction: self.direction.as_deref().and_then(position),
        })
    }
}

/// Column positions resolved against one concrete header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundColumns {
    start_time: usize,
    talk_time: usize,
    agent_name: usize,
    ring_time: Option<usize>,
    direction: Option<usize>,
}

impl BoundColumns {
    /// Extract one raw record from a row of string fields
    ///
    /// Short rows simply yield absent fields; whether those records survive
    /// is decided by the normalizer, not here.
    pub fn raw_record(&self, fields: &[String]) -> RawRecord {
        let get = |index: usize| fields.get(index).map(|value| value.to_string());
        RawRecord {
            start_time: get(self.start_time).unwrap_or_default(),
            talk_time: get(self.talk_time),
            ring_time: self.ring_time.and_then(get),
            agent_name: get(self.agent_name),
            direction: self.direction.and_then(get),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_bind_default_export_headers() {
        let map = ColumnMap::default();
        let bound = map
            .bind(&headers(&[
                "Call Type",
                "Call Start Time",
                "Ring Time",
                "Talk Time",
                "Agent Name",
            ]))
            .expect("all columns present");

        let record = bound.raw_record(&headers(&[
            "Inbound",
            "2024-07-01 09:15:00",
            "0:00:12",
            "0:03:40",
            "Jorge",
        ]));
        assert_eq!(record.start_time, "2024-07-01 09:15:00");
        assert_eq!(record.talk_time.as_deref(), Some("0:03:40"));
        assert_eq!(record.ring_time.as_deref(), Some("0:00:12"));
        assert_eq!(record.agent_name.as_deref(), Some("Jorge"));
        assert_eq!(record.direction.as_deref(), Some("Inbound"));
    }

    #[test]
    fn test_bind_reports_every_missing_required_column() {
        let map = ColumnMap::default();
        let err = map.bind(&headers(&["Ring Time"])).unwrap_err();
        match err {
            AnalyticsError::MissingColumns { columns } => {
                assert_eq!(
                    columns,
                    vec!["Call Start Time", "Talk Time", "Agent Name"]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let map = ColumnMap::default();
        let bound = map
            .bind(&headers(&["Call Start Time", "Talk Time", "Agent Name"]))
            .expect("required columns present");
        let record = bound.raw_record(&headers(&["2024-07-01 09:15:00", "0:00:00", ""]));
        assert!(record.ring_time.is_none());
        assert!(record.direction.is_none());
    }

    #[test]
    fn test_short_rows_yield_absent_fields() {
        let map = ColumnMap::default();
        let bound = map
            .bind(&headers(&["Call Start Time", "Talk Time", "Agent Name"]))
            .unwrap();
        let record = bound.raw_record(&headers(&["2024-07-01 09:15:00"]));
        assert!(record.talk_time.is_none());
        assert!(record.agent_name.is_none());
    }
}
