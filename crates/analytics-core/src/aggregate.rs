//! Aggregate views over raw and attributed records
//!
//! Everything here is a pure function of its input set, rebuilt in full per
//! request. `BTreeMap`s keep iteration (and therefore serialization) order
//! deterministic, so identical inputs always render identical reports.
//!
//! Ratio policy: percentage fields are `Option<f64>`, and a group with a zero
//! denominator yields `None` ("no data") rather than `0.0` or a NaN. Date
//! groups only materialize from actual records, so an all-empty day is
//! skipped rather than emitted with zeros.

use crate::attribution::Attribution;
use crate::classify::MissedCallRule;
use crate::config::MatrixConfig;
use crate::record::CallRecord;
use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

/// Percentage of `part` in `whole`; `None` when the group is empty
fn ratio_pct(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 * 100.0 / whole as f64)
    }
}

/// Daily call totals and derived ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyProductivity {
    /// Calls received this day
    pub received: u64,
    /// Calls classified as missed
    pub missed: u64,
    /// `100 * (received - missed) / received`; `None` when `received == 0`
    pub productivity_pct: Option<f64>,
    /// `100 - productivity_pct`; `None` when `received == 0`
    pub abandonment_pct: Option<f64>,
}

impl DailyProductivity {
    /// Derive the ratio fields from raw counts
    pub fn from_counts(received: u64, missed: u64) -> Self {
        let productivity_pct = ratio_pct(received.saturating_sub(missed), received);
        Self {
            received,
            missed,
            productivity_pct,
            abandonment_pct: productivity_pct.map(|pct| 100.0 - pct),
        }
    }
}

/// Per-day productivity over the raw (non-expanded) record set
pub fn daily_productivity(
    records: &[CallRecord],
    rule: MissedCallRule,
) -> BTreeMap<NaiveDate, DailyProductivity> {
    let mut counts: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for record in records {
        let entry = counts.entry(record.date).or_default();
        entry.0 += 1;
        if rule.is_missed(record) {
            entry.1 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(date, (received, missed))| (date, DailyProductivity::from_counts(received, missed)))
        .collect()
}

/// Per-agent, per-day detail over the attributed set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentDailyDetail {
    /// Attributed rows charged to this agent this day
    pub total: u64,
    /// Of those, rows for missed calls
    pub missed: u64,
    /// Of those, rows for attended calls
    pub attended: u64,
    /// `100 * attended / total`; `None` when `total == 0`
    pub productivity_pct: Option<f64>,
    /// Mean talk seconds over attended calls with known talk time
    pub avg_talk_seconds: Option<f64>,
    /// Mean ring seconds over attended calls with known ring time
    pub avg_ring_seconds: Option<f64>,
}

/// Group the attributed set by (agent, date)
///
/// Averages are computed only over attended calls whose duration is known;
/// unknown durations neither contribute to the sum nor the divisor.
pub fn agent_daily_detail(
    attribution: &Attribution,
) -> BTreeMap<(String, NaiveDate), AgentDailyDetail> {
    #[derive(Default)]
    struct Accumulator {
        total: u64,
        missed: u64,
        talk_seconds: f64,
        talk_samples: u64,
        ring_seconds: f64,
        ring_samples: u64,
    }

    let mut groups: BTreeMap<(String, NaiveDate), Accumulator> = BTreeMap::new();
    for attributed in &attribution.records {
        let key = (attributed.agent.clone(), attributed.call.date);
        let acc = groups.entry(key).or_default();
        acc.total += 1;
        if attributed.missed {
            acc.missed += 1;
        } else {
            if let Some(talk) = attributed.call.talk_time {
                acc.talk_seconds += talk.as_secs_f64();
                acc.talk_samples += 1;
            }
            if let Some(ring) = attributed.call.ring_time {
                acc.ring_seconds += ring.as_secs_f64();
                acc.ring_samples += 1;
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let attended = acc.total - acc.missed;
            let detail = AgentDailyDetail {
                total: acc.total,
                missed: acc.missed,
                attended,
                productivity_pct: ratio_pct(attended, acc.total),
                avg_talk_seconds: (acc.talk_samples > 0)
                    .then(|| acc.talk_seconds / acc.talk_samples as f64),
                avg_ring_seconds: (acc.ring_samples > 0)
                    .then(|| acc.ring_seconds / acc.ring_samples as f64),
            };
            (key, detail)
        })
        .collect()
}

/// Count matrix indexed by display hour × weekday
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourWeekdayMatrix {
    /// Displayed hours, ascending
    pub hours: Vec<u8>,
    /// Displayed weekdays, in configured order
    pub weekdays: Vec<Weekday>,
    counts: Vec<Vec<u64>>,
}

impl HourWeekdayMatrix {
    /// An all-zero matrix with the configured layout
    pub fn new(config: &MatrixConfig) -> Self {
        let hours: Vec<u8> = (config.hour_start..=config.hour_end).collect();
        let weekdays = config.weekdays.clone();
        let counts = vec![vec![0; weekdays.len()]; hours.len()];
        Self {
            hours,
            weekdays,
            counts,
        }
    }

    /// Tally (hour, weekday) cells into a fresh matrix
    ///
    /// Cells outside the configured hour range or weekday set are ignored.
    pub fn from_cells(
        cells: impl IntoIterator<Item = (u8, Weekday)>,
        config: &MatrixConfig,
    ) -> Self {
        let mut matrix = Self::new(config);
        for (hour, weekday) in cells {
            matrix.tally(hour, weekday);
        }
        matrix
    }

    fn tally(&mut self, hour: u8, weekday: Weekday) {
        let Some(row) = self.hours.iter().position(|&h| h == hour) else {
            return;
        };
        let Some(column) = self.weekdays.iter().position(|&w| w == weekday) else {
            return;
        };
        self.counts[row][column] += 1;
    }

    /// Count for one cell; zero for cells outside the layout
    pub fn count(&self, hour: u8, weekday: Weekday) -> u64 {
        let row = self.hours.iter().position(|&h| h == hour);
        let column = self.weekdays.iter().position(|&w| w == weekday);
        match (row, column) {
            (Some(row), Some(column)) => self.counts[row][column],
            _ => 0,
        }
    }

    /// One displayed row of counts, by hour position
    pub fn row(&self, index: usize) -> &[u64] {
        &self.counts[index]
    }

    /// Sum of every cell
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Build the matrix over raw records matching a predicate
pub fn hour_by_weekday_matrix<F>(
    records: &[CallRecord],
    predicate: F,
    config: &MatrixConfig,
) -> HourWeekdayMatrix
where
    F: Fn(&CallRecord) -> bool,
{
    HourWeekdayMatrix::from_cells(
        records
            .iter()
            .filter(|record| predicate(record))
            .map(|record| (record.hour, record.weekday)),
        config,
    )
}

/// Distribution summary of attended talk time for one agent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TalkTimeSummary {
    /// Attended calls with known talk time
    pub calls: u64,
    /// Mean talk seconds; `None` when `calls == 0`
    pub mean_seconds: Option<f64>,
    /// Shortest attended call in seconds
    pub min_seconds: Option<f64>,
    /// Longest attended call in seconds
    pub max_seconds: Option<f64>,
}

/// Summarize attended talk time for the given agent
pub fn talk_time_summary(attribution: &Attribution, agent: &str) -> TalkTimeSummary {
    let mut summary = TalkTimeSummary::default();
    let mut sum = 0.0;
    for attributed in attribution.attended() {
        if attributed.agent != agent {
            continue;
        }
        let Some(talk) = attributed.call.talk_time else {
            continue;
        };
        let seconds = talk.as_secs_f64();
        summary.calls += 1;
        sum += seconds;
        summary.min_seconds = Some(summary.min_seconds.map_or(seconds, |m: f64| m.min(seconds)));
        summary.max_seconds = Some(summary.max_seconds.map_or(seconds, |m: f64| m.max(seconds)));
    }
    if summary.calls > 0 {
        summary.mean_seconds = Some(sum / summary.calls as f64);
    }
    summary
}
