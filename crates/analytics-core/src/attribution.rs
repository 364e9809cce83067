//! Missed-call attribution: the expansion from calls to responsibility
//!
//! This is the core algorithm of the pipeline. Every normalized record
//! expands into zero, one, or several [`AttributedRecord`]s:
//!
//! ```text
//!                      ┌────────────────────────────┐
//!                      │       CallRecord r         │
//!                      └─────────────┬──────────────┘
//!                                    │ is_missed(r)?
//!                   no               │               yes
//!         ┌──────────────────────────┴──────────────────────────┐
//!         │                                                     │
//!  agent attached?                                     roster coverage at r.hour?
//!   yes │      │ no                                     yes │        │ no
//!       ▼      ▼                                            ▼        ▼
//!  (r, agent)  drop                          one (r, a) per on-duty  agent attached?
//!                                            agent a  (fan-out)      yes: (r, agent)
//!                                                                    no:  drop
//! ```
//!
//! Fan-out is deliberate: a missed call during a multi-agent coverage window
//! counts against every on-duty agent, because coverage responsibility is
//! shared. Dropped records are counted, never silently lost.
//!
//! Records are identified by their source row. Two distinct missed calls that
//! happen to share a timestamp and an empty agent name both fan out; no step
//! of this module compares records by field equality. The one exception is
//! the explicit, off-by-default [`dedup collapse`](crate::config::AnalyticsConfig::dedup_missed)
//! retained for deployments that shipped with it.

use crate::classify::MissedCallRule;
use crate::record::CallRecord;
use crate::roster::Roster;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// One (call, responsible agent) pair produced by the expander
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedRecord {
    /// The underlying call; fan-out rows share the same call value and
    /// `source_row`
    pub call: CallRecord,
    /// The agent charged with this row
    pub agent: String,
    /// Classifier verdict for the underlying call
    pub missed: bool,
}

/// The expander's complete output for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attribution {
    /// Attributed rows, in input order (fan-out preserves roster order)
    pub records: Vec<AttributedRecord>,
    /// Input records that produced no attribution
    pub dropped: usize,
}

impl Attribution {
    /// Attributed rows classified as missed
    pub fn missed(&self) -> impl Iterator<Item = &AttributedRecord> {
        self.records.iter().filter(|record| record.missed)
    }

    /// Attributed rows classified as attended
    pub fn attended(&self) -> impl Iterator<Item = &AttributedRecord> {
        self.records.iter().filter(|record| !record.missed)
    }
}

/// Expand normalized records into attributed records
///
/// Deterministic for fixed input and configuration: output order follows
/// input order, and fan-out order follows roster insertion order.
pub fn attribute(
    records: &[CallRecord],
    roster: &Roster,
    rule: MissedCallRule,
    dedup_missed: bool,
) -> Attribution {
    let mut out = Attribution::default();
    // Only populated when the legacy collapse is enabled.
    let mut seen_missed: HashSet<(chrono::NaiveDateTime, String)> = HashSet::new();

    for record in records {
        let missed = rule.is_missed(record);

        if missed && dedup_missed {
            let key = (record.start_time, record.raw_agent_name.clone());
            if !seen_missed.insert(key) {
                out.dropped += 1;
                continue;
            }
        }

        if !missed {
            if record.has_agent() {
                out.records.push(AttributedRecord {
                    call: record.clone(),
                    agent: record.agent_name.clone(),
                    missed: false,
                });
            } else {
                // Answered call with no agent: data-quality gap, not an error.
                out.dropped += 1;
            }
            continue;
        }

        let on_duty = roster.agents_on_duty(record.hour);
        if !on_duty.is_empty() {
            for agent in on_duty {
                out.records.push(AttributedRecord {
                    call: record.clone(),
                    agent: agent.clone(),
                    missed: true,
                });
            }
        } else if record.has_agent() {
            out.records.push(AttributedRecord {
                call: record.clone(),
                agent: record.agent_name.clone(),
                missed: true,
            });
        } else {
            out.dropped += 1;
        }
    }

    debug!(
        input = records.len(),
        attributed = out.records.len(),
        dropped = out.dropped,
        "expanded call records"
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn record(source_row: usize, hour: u32, talk: Option<Duration>, agent: &str) -> CallRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        CallRecord::new(source_row, ts, talk, None, agent.to_string(), agent.to_string())
    }

    fn staffed_roster() -> Roster {
        Roster::builder()
            .shift(8, 10, ["Ana"])
            .shift(10, 12, ["Ana", "Bruno"])
            .shift(12, 16, ["Ana", "Bruno", "Celia"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_answered_call_attributes_to_its_agent() {
        let records = vec![record(0, 9, Some(Duration::from_secs(120)), "Ana")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].agent, "Ana");
        assert!(!out.records[0].missed);
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn test_answered_call_without_agent_is_dropped() {
        let records = vec![record(0, 9, Some(Duration::from_secs(120)), "")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert!(out.records.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_missed_call_fans_out_to_all_on_duty() {
        // Hour 13 sits in the three-agent window.
        let records = vec![record(0, 13, Some(Duration::ZERO), "")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        let agents: Vec<&str> = out.records.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(agents, ["Ana", "Bruno", "Celia"]);
        assert!(out.records.iter().all(|r| r.missed));
        assert!(out.records.iter().all(|r| r.call.source_row == 0));
    }

    #[test]
    fn test_missed_call_two_agent_window() {
        let records = vec![record(0, 11, Some(Duration::ZERO), "")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        let agents: Vec<&str> = out.records.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(agents, ["Ana", "Bruno"]);
    }

    #[test]
    fn test_missed_call_outside_coverage_falls_back_to_agent() {
        let records = vec![record(0, 21, Some(Duration::ZERO), "Ana")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].agent, "Ana");
        assert!(out.records[0].missed);
    }

    #[test]
    fn test_missed_call_outside_coverage_without_agent_is_dropped() {
        let records = vec![record(0, 21, Some(Duration::ZERO), "")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert!(out.records.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_identical_missed_calls_both_fan_out() {
        // Two distinct calls sharing timestamp and empty agent: identity is
        // the source row, so both must expand.
        let records = vec![
            record(0, 13, Some(Duration::ZERO), ""),
            record(1, 13, Some(Duration::ZERO), ""),
        ];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert_eq!(out.records.len(), 6);
        assert_eq!(out.records.iter().filter(|r| r.call.source_row == 0).count(), 3);
        assert_eq!(out.records.iter().filter(|r| r.call.source_row == 1).count(), 3);
    }

    #[test]
    fn test_legacy_dedup_collapses_value_equal_missed_calls() {
        let records = vec![
            record(0, 13, Some(Duration::ZERO), ""),
            record(1, 13, Some(Duration::ZERO), ""),
        ];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, true);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_rule_b_keeps_agent_answered_zero_talk() {
        // Zero talk time with an agent attached: Rule B says attended.
        let records = vec![record(0, 13, Some(Duration::ZERO), "Jorge")];
        let out = attribute(
            &records,
            &staffed_roster(),
            MissedCallRule::ZeroTalkTimeNoAgent,
            false,
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].agent, "Jorge");
        assert!(!out.records[0].missed);
    }

    #[test]
    fn test_unknown_talk_time_treated_as_attended() {
        let records = vec![record(0, 13, None, "Ana")];
        let out = attribute(&records, &staffed_roster(), MissedCallRule::ZeroTalkTime, false);
        assert_eq!(out.records.len(), 1);
        assert!(!out.records[0].missed);
    }
}
