//! Statistical anomaly detection over grouped call series
//!
//! Two detectors run over the attributed set, per agent:
//!
//! - **Volume spikes**: hours whose call count exceeds
//!   `mean + threshold_sigma * stddev` of that agent's per-hour series.
//!   The stddev is the sample standard deviation (ddof = 1). Series that are
//!   too short (`< min_samples`) or have zero variance produce no flags; a
//!   flat series is normal, not uniformly anomalous.
//! - **Coverage gaps**: interior hours with zero calls strictly between two
//!   of the agent's active hours.
//!
//! Output order is deterministic: agents alphabetically, spikes before gaps,
//! hours ascending.

use crate::attribution::Attribution;
use crate::config::AnomalyConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One detected anomaly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Call volume for an agent spiked above the statistical threshold
    VolumeSpike {
        agent: String,
        hour: u8,
        count: u64,
        threshold: f64,
    },
    /// An agent went silent for an hour between two active hours
    CoverageGap { agent: String, hour: u8 },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VolumeSpike {
                agent,
                hour,
                count,
                threshold,
            } => write!(
                f,
                "call volume spike for {agent}: {count} calls at {hour:02}:00 (threshold {threshold:.1})"
            ),
            Self::CoverageGap { agent, hour } => write!(
                f,
                "{agent} had no calls at {hour:02}:00 between active hours"
            ),
        }
    }
}

/// Sample standard deviation (ddof = 1); `None` for series shorter than 2
fn sample_stddev(values: &[u64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values
        .iter()
        .map(|&value| {
            let delta = value as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Run both detectors over the attributed set
pub fn detect(attribution: &Attribution, config: &AnomalyConfig) -> Vec<Anomaly> {
    // agent -> hour -> attributed call count
    let mut per_agent: BTreeMap<&str, BTreeMap<u8, u64>> = BTreeMap::new();
    for attributed in &attribution.records {
        *per_agent
            .entry(attributed.agent.as_str())
            .or_default()
            .entry(attributed.call.hour)
            .or_default() += 1;
    }

    let mut anomalies = Vec::new();
    for (agent, by_hour) in &per_agent {
        let counts: Vec<u64> = by_hour.values().copied().collect();

        if counts.len() >= config.min_samples {
            let mean = counts.iter().sum::<u64>() as f64 / counts.len() as f64;
            if let Some(stddev) = sample_stddev(&counts, mean) {
                // Zero variance: a flat series has no spikes by definition.
                if stddev > 0.0 {
                    let threshold = mean + config.threshold_sigma * stddev;
                    for (&hour, &count) in by_hour {
                        if count as f64 > threshold {
                            anomalies.push(Anomaly::VolumeSpike {
                                agent: agent.to_string(),
                                hour,
                                count,
                                threshold,
                            });
                        }
                    }
                }
            }
        }

        // Gap scan: every hour present in the map has at least one call, so
        // active hours are exactly the keys.
        let active: Vec<u8> = by_hour.keys().copied().collect();
        for pair in active.windows(2) {
            for hour in pair[0] + 1..pair[1] {
                anomalies.push(Anomaly::CoverageGap {
                    agent: agent.to_string(),
                    hour,
                });
            }
        }
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::{AttributedRecord, Attribution};
    use crate::record::CallRecord;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn attributed(agent: &str, hour: u32, source_row: usize) -> AttributedRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        AttributedRecord {
            call: CallRecord::new(
                source_row,
                ts,
                Some(Duration::from_secs(60)),
                None,
                agent.to_string(),
                agent.to_string(),
            ),
            agent: agent.to_string(),
            missed: false,
        }
    }

    fn attribution_of(rows: Vec<AttributedRecord>) -> Attribution {
        Attribution {
            records: rows,
            dropped: 0,
        }
    }

    #[test]
    fn test_constant_series_yields_no_spikes() {
        // 5 calls every hour for 10 hours: zero variance, zero alerts.
        let mut rows = Vec::new();
        let mut source_row = 0;
        for hour in 8..18u32 {
            for _ in 0..5 {
                rows.push(attributed("Ana", hour, source_row));
                source_row += 1;
            }
        }
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_single_sample_series_yields_no_spikes() {
        let rows = vec![attributed("Ana", 9, 0)];
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_spike_is_flagged() {
        // Baseline of 2 calls/hour with one 40-call hour.
        let mut rows = Vec::new();
        let mut source_row = 0;
        for hour in 8..16u32 {
            let volume = if hour == 12 { 40 } else { 2 };
            for _ in 0..volume {
                rows.push(attributed("Ana", hour, source_row));
                source_row += 1;
            }
        }
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        let spikes: Vec<&Anomaly> = anomalies
            .iter()
            .filter(|a| matches!(a, Anomaly::VolumeSpike { .. }))
            .collect();
        assert_eq!(spikes.len(), 1);
        match spikes[0] {
            Anomaly::VolumeSpike { agent, hour, count, .. } => {
                assert_eq!(agent, "Ana");
                assert_eq!(*hour, 12);
                assert_eq!(*count, 40);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_coverage_gap_between_active_hours() {
        // Active at 9 and 12: hours 10 and 11 are interior gaps.
        let rows = vec![attributed("Ana", 9, 0), attributed("Ana", 12, 1)];
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        let gaps: Vec<u8> = anomalies
            .iter()
            .filter_map(|a| match a {
                Anomaly::CoverageGap { hour, .. } => Some(*hour),
                _ => None,
            })
            .collect();
        assert_eq!(gaps, vec![10, 11]);
    }

    #[test]
    fn test_no_gap_for_contiguous_hours() {
        let rows = vec![
            attributed("Ana", 9, 0),
            attributed("Ana", 10, 1),
            attributed("Ana", 11, 2),
        ];
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_agents_are_independent() {
        // Bruno's silence at 10:00 is a gap for Bruno only.
        let rows = vec![
            attributed("Ana", 9, 0),
            attributed("Ana", 10, 1),
            attributed("Ana", 11, 2),
            attributed("Bruno", 9, 3),
            attributed("Bruno", 11, 4),
        ];
        let anomalies = detect(&attribution_of(rows), &AnomalyConfig::default());
        assert_eq!(
            anomalies,
            vec![Anomaly::CoverageGap {
                agent: "Bruno".to_string(),
                hour: 10
            }]
        );
    }

    #[test]
    fn test_display_renderings() {
        let spike = Anomaly::VolumeSpike {
            agent: "Ana".to_string(),
            hour: 12,
            count: 40,
            threshold: 15.5,
        };
        assert_eq!(
            spike.to_string(),
            "call volume spike for Ana: 40 calls at 12:00 (threshold 15.5)"
        );
        let gap = Anomaly::CoverageGap {
            agent: "Ana".to_string(),
            hour: 9,
        };
        assert_eq!(gap.to_string(), "Ana had no calls at 09:00 between active hours");
    }
}
