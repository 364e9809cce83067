//! # Analytics Engine
//!
//! The engine is the coordination layer of the pipeline: it owns the
//! validated configuration and the one immutable normalized dataset, and
//! re-runs the pure pipeline for every report request.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            AnalyticsEngine              │
//! ├─────────────────────────────────────────┤
//! │ load(source)   →  NormalizedBatch cache │
//! ├─────────────────────────────────────────┤
//! │ report(filter) →  classify → attribute  │
//! │                   → aggregate → detect  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The cache is keyed solely on the source identity, never on filter
//! parameters: changing the date range or agent selection re-runs the pure
//! pipeline over the same batch. Nothing mutates after load, so an embedding
//! service can share one engine snapshot across requests without locking.
//!
//! ## Examples
//!
//! ```rust
//! use callboard_analytics_core::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let roster = Roster::builder()
//!     .shift(8, 12, ["Ana"])
//!     .shift(12, 16, ["Ana", "Bruno"])
//!     .build()?;
//! let config = AnalyticsConfig::new().with_roster(roster);
//!
//! let mut engine = AnalyticsEngine::new(config)?;
//! engine.load(
//!     "july.csv",
//!     vec![
//!         RawRecord {
//!             start_time: "2024-07-01 09:15:00".to_string(),
//!             talk_time: Some("0:02:10".to_string()),
//!             agent_name: Some("Ana".to_string()),
//!             ..Default::default()
//!         },
//!         RawRecord {
//!             start_time: "2024-07-01 13:40:00".to_string(),
//!             talk_time: Some("0:00:00".to_string()),
//!             ..Default::default()
//!         },
//!     ],
//! );
//!
//! let report = engine.report(&ReportFilter::default())?;
//! assert_eq!(report.attributed, 3); // one attended + two-agent fan-out
//! # Ok(())
//! # }
//! ```

use crate::aggregate::{
    agent_daily_detail, daily_productivity, hour_by_weekday_matrix, talk_time_summary,
    AgentDailyDetail, DailyProductivity, HourWeekdayMatrix, TalkTimeSummary,
};
use crate::anomaly::{detect, Anomaly};
use crate::attribution::attribute;
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::normalize::{normalize, NormalizedBatch};
use crate::record::{CallRecord, RawRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tracing::info;

/// Report parameters: an inclusive date range and an optional agent focus
///
/// The agent focus narrows the per-agent views (daily detail and talk-time
/// summaries); the overall tables and anomaly scan always cover every agent
/// in range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportFilter {
    /// First included date
    pub from: Option<NaiveDate>,
    /// Last included date
    pub to: Option<NaiveDate>,
    /// Restrict per-agent views to this canonical agent name
    pub agent: Option<String>,
}

impl ReportFilter {
    /// Filter covering a closed date range
    pub fn date_range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            agent: None,
        }
    }

    fn includes(&self, record: &CallRecord) -> bool {
        if let Some(from) = self.from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.date > to {
                return false;
            }
        }
        true
    }
}

/// One row of the per-agent daily detail table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDailyRow {
    /// Canonical agent name
    pub agent: String,
    /// Calendar date
    pub date: NaiveDate,
    /// The aggregated counts and averages
    #[serde(flatten)]
    pub detail: AgentDailyDetail,
}

/// Everything one report request produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    /// Per-day productivity over the raw record set
    pub daily: BTreeMap<NaiveDate, DailyProductivity>,
    /// Per-agent daily detail rows, sorted by (agent, date)
    pub agent_detail: Vec<AgentDailyRow>,
    /// Received-call counts, hour × weekday
    pub call_matrix: HourWeekdayMatrix,
    /// Missed-call counts over the attributed (expanded) set, hour × weekday
    pub missed_matrix: HourWeekdayMatrix,
    /// Attended talk-time summaries per agent
    pub talk_time: BTreeMap<String, TalkTimeSummary>,
    /// Detected anomalies, deterministically ordered
    pub anomalies: Vec<Anomaly>,
    /// Attributed rows produced by the expander
    pub attributed: usize,
    /// Records the expander dropped (no attribution possible)
    pub dropped: usize,
    /// Source rows discarded at normalization for bad timestamps
    pub discarded_rows: usize,
}

struct Dataset {
    source_id: String,
    batch: NormalizedBatch,
}

/// The analytics engine: validated configuration plus a cached dataset
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    dataset: Option<Dataset>,
}

impl AnalyticsEngine {
    /// Create an engine, validating the configuration up front
    ///
    /// Misconfiguration (overlapping roster shifts, bad thresholds) fails
    /// here, before any data is touched.
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        info!(
            rule = %config.missed_rule,
            shifts = config.roster.shifts().len(),
            aliases = config.aliases.len(),
            "analytics engine configured"
        );
        Ok(Self {
            config,
            dataset: None,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Normalize and cache a dataset
    ///
    /// The cache key is the source identity alone. Loading the same id again
    /// is a no-op that keeps the existing batch; a new id replaces it.
    pub fn load(
        &mut self,
        source_id: &str,
        rows: impl IntoIterator<Item = RawRecord>,
    ) -> &NormalizedBatch {
        let cached = self
            .dataset
            .as_ref()
            .is_some_and(|dataset| dataset.source_id == source_id);
        if cached {
            info!(source = source_id, "reusing cached dataset");
        } else {
            let batch = normalize(rows, &self.config.aliases, &self.config.timestamp_format);
            info!(
                source = source_id,
                records = batch.len(),
                discarded = batch.discarded,
                "dataset loaded"
            );
            self.dataset = Some(Dataset {
                source_id: source_id.to_string(),
                batch,
            });
        }
        &self.dataset.as_ref().unwrap().batch
    }

    /// Identity of the cached dataset, if any
    pub fn loaded_source(&self) -> Option<&str> {
        self.dataset.as_ref().map(|dataset| dataset.source_id.as_str())
    }

    /// Run the full pipeline over the cached dataset
    pub fn report(&self, filter: &ReportFilter) -> Result<AnalyticsReport> {
        let dataset = self.dataset.as_ref().ok_or_else(|| {
            AnalyticsError::no_dataset("load a source before requesting a report")
        })?;

        let records: Vec<CallRecord> = dataset
            .batch
            .records
            .iter()
            .filter(|record| filter.includes(record))
            .cloned()
            .collect();

        let attribution = attribute(
            &records,
            &self.config.roster,
            self.config.missed_rule,
            self.config.dedup_missed,
        );

        let daily = daily_productivity(&records, self.config.missed_rule);

        let agent_detail: Vec<AgentDailyRow> = agent_daily_detail(&attribution)
            .into_iter()
            .filter(|((agent, _), _)| {
                filter
                    .agent
                    .as_ref()
                    .map_or(true, |focus| agent == focus)
            })
            .map(|((agent, date), detail)| AgentDailyRow {
                agent,
                date,
                detail,
            })
            .collect();

        let call_matrix = hour_by_weekday_matrix(&records, |_| true, &self.config.matrix);
        let missed_matrix = HourWeekdayMatrix::from_cells(
            attribution
                .missed()
                .map(|attributed| (attributed.call.hour, attributed.call.weekday)),
            &self.config.matrix,
        );

        let focus_agents: BTreeSet<String> = match &filter.agent {
            Some(agent) => [agent.clone()].into(),
            None => attribution
                .records
                .iter()
                .map(|attributed| attributed.agent.clone())
                .collect(),
        };
        let talk_time: BTreeMap<String, TalkTimeSummary> = focus_agents
            .into_iter()
            .map(|agent| {
                let summary = talk_time_summary(&attribution, &agent);
                (agent, summary)
            })
            .collect();

        let anomalies = detect(&attribution, &self.config.anomaly);

        info!(
            records = records.len(),
            attributed = attribution.records.len(),
            dropped = attribution.dropped,
            anomalies = anomalies.len(),
            "report computed"
        );

        Ok(AnalyticsReport {
            daily,
            agent_detail,
            call_matrix,
            missed_matrix,
            talk_time,
            anomalies,
            attributed: attribution.records.len(),
            dropped: attribution.dropped,
            discarded_rows: dataset.batch.discarded,
        })
    }
}

/// One-shot convenience: load, report, done
pub fn run_pipeline(
    config: AnalyticsConfig,
    rows: impl IntoIterator<Item = RawRecord>,
    filter: &ReportFilter,
) -> Result<AnalyticsReport> {
    let mut engine = AnalyticsEngine::new(config)?;
    engine.load("inline", rows);
    engine.report(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;

    fn raw(start: &str, talk: &str, agent: &str) -> RawRecord {
        RawRecord {
            start_time: start.to_string(),
            talk_time: Some(talk.to_string()),
            ring_time: None,
            agent_name: (!agent.is_empty()).then(|| agent.to_string()),
            direction: None,
        }
    }

    fn engine() -> AnalyticsEngine {
        let roster = Roster::builder()
            .shift(8, 12, ["Ana"])
            .shift(12, 16, ["Ana", "Bruno"])
            .build()
            .unwrap();
        AnalyticsEngine::new(AnalyticsConfig::new().with_roster(roster)).unwrap()
    }

    #[test]
    fn test_report_requires_loaded_dataset() {
        let engine = engine();
        let err = engine.report(&ReportFilter::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::NoDataset { .. }));
    }

    #[test]
    fn test_cache_is_keyed_on_source_identity() {
        let mut engine = engine();
        engine.load("a.csv", vec![raw("2024-07-01 09:00:00", "0:01:00", "Ana")]);
        assert_eq!(engine.loaded_source(), Some("a.csv"));

        // Same id: the cached batch survives even though the rows differ.
        let batch = engine.load("a.csv", vec![]);
        assert_eq!(batch.len(), 1);

        // New id: the cache is replaced.
        let batch = engine.load("b.csv", vec![]);
        assert_eq!(batch.len(), 0);
        assert_eq!(engine.loaded_source(), Some("b.csv"));
    }

    #[test]
    fn test_filter_is_inclusive_on_both_ends() {
        let mut engine = engine();
        engine.load(
            "a.csv",
            vec![
                raw("2024-07-01 09:00:00", "0:01:00", "Ana"),
                raw("2024-07-02 09:00:00", "0:01:00", "Ana"),
                raw("2024-07-03 09:00:00", "0:01:00", "Ana"),
            ],
        );
        let filter = ReportFilter::date_range(
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
        );
        let report = engine.report(&filter).unwrap();
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.attributed, 2);
    }

    #[test]
    fn test_agent_focus_narrows_per_agent_views_only() {
        let mut engine = engine();
        engine.load(
            "a.csv",
            vec![
                raw("2024-07-01 09:00:00", "0:01:00", "Ana"),
                raw("2024-07-01 10:00:00", "0:02:00", "Bruno"),
            ],
        );
        let filter = ReportFilter {
            agent: Some("Ana".to_string()),
            ..Default::default()
        };
        let report = engine.report(&filter).unwrap();
        assert_eq!(report.agent_detail.len(), 1);
        assert_eq!(report.agent_detail[0].agent, "Ana");
        assert_eq!(report.talk_time.len(), 1);
        // The daily table still sees both calls.
        let day = report
            .daily
            .values()
            .next()
            .expect("one day present");
        assert_eq!(day.received, 2);
    }

    #[test]
    fn test_empty_range_produces_empty_report() {
        let mut engine = engine();
        engine.load("a.csv", vec![raw("2024-07-01 09:00:00", "0:01:00", "Ana")]);
        let filter = ReportFilter::date_range(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
        );
        let report = engine.report(&filter).unwrap();
        // Zero-call ranges yield empty tables, not zeroed rows.
        assert!(report.daily.is_empty());
        assert!(report.agent_detail.is_empty());
        assert_eq!(report.attributed, 0);
        assert!(report.anomalies.is_empty());
    }
}
