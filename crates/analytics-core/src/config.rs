//! Analytics configuration structures
//!
//! This module provides the configuration surface for the analytics pipeline:
//! the agent alias table, classifier rule selection, the staffing roster,
//! anomaly thresholds, and the hour-by-weekday matrix layout. All of it is
//! serde-derived so deployments can keep a `callboard.toml` next to their
//! export, and builder methods cover programmatic construction.
//!
//! # Examples
//!
//! ```rust
//! use callboard_analytics_core::config::AnalyticsConfig;
//! use callboard_analytics_core::classify::MissedCallRule;
//! use callboard_analytics_core::roster::Roster;
//!
//! let roster = Roster::builder()
//!     .shift(8, 12, ["Ana"])
//!     .shift(12, 16, ["Ana", "Bruno"])
//!     .build()
//!     .unwrap();
//!
//! let config = AnalyticsConfig::new()
//!     .with_roster(roster)
//!     .with_missed_rule(MissedCallRule::ZeroTalkTimeNoAgent)
//!     .with_anomaly_threshold(3.0);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.anomaly.threshold_sigma, 3.0);
//! ```

use crate::classify::MissedCallRule;
use crate::error::{AnalyticsError, Result};
use crate::roster::Roster;
use crate::schema::ColumnMap;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Agent alias table: exported short name → canonical full name
///
/// Matching is exact-string after trimming and ASCII-case folding of the
/// lookup key; names not in the table pass through trimmed but otherwise
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    /// Create an empty alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one alias → canonical mapping
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.entries.insert(alias.into(), canonical.into());
    }

    /// Resolve an exported name to its canonical form
    pub fn resolve(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.entries
            .iter()
            .find(|(alias, _)| alias.trim().eq_ignore_ascii_case(trimmed))
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Number of configured aliases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for AliasTable {
    fn from_iter<T: IntoIterator<Item = (A, C)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(alias, canonical)| (alias.into(), canonical.into()))
                .collect(),
        }
    }
}

/// Anomaly detector thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Spike threshold in standard deviations above the mean
    pub threshold_sigma: f64,
    /// Minimum series length before spike detection applies
    pub min_samples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold_sigma: 2.0,
            min_samples: 2,
        }
    }
}

/// Layout of the hour-by-weekday count matrices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// First displayed hour (inclusive)
    pub hour_start: u8,
    /// Last displayed hour (inclusive)
    pub hour_end: u8,
    /// Weekdays included in the matrix, in display order
    pub weekdays: Vec<Weekday>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            hour_start: 8,
            hour_end: 20,
            // Sunday is excluded by default: the roster has no Sunday coverage.
            weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
        }
    }
}

/// Top-level configuration for the analytics pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// `chrono` format string for the start-time column
    pub timestamp_format: String,
    /// Agent alias resolution table
    pub aliases: AliasTable,
    /// Missed-call classifier rule (A or B)
    pub missed_rule: MissedCallRule,
    /// Collapse missed calls sharing (start time, raw agent) before fan-out.
    ///
    /// Off by default. Some deployments shipped with this collapse, but it
    /// conflates independent missed calls that happen to share a timestamp;
    /// it is exposed only until product confirms whether the source data is
    /// double-counted.
    pub dedup_missed: bool,
    /// Time-of-day staffing roster
    pub roster: Roster,
    /// Anomaly detector thresholds
    pub anomaly: AnomalyConfig,
    /// Hour-by-weekday matrix layout
    pub matrix: MatrixConfig,
    /// Source column header names
    pub columns: ColumnMap,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsConfig {
    /// Create a configuration with defaults (empty alias table, empty roster,
    /// Rule A, 2.0σ threshold, Monday-Saturday 08-20 matrix)
    pub fn new() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            aliases: AliasTable::new(),
            missed_rule: MissedCallRule::default(),
            dedup_missed: false,
            roster: Roster::default(),
            anomaly: AnomalyConfig::default(),
            matrix: MatrixConfig::default(),
            columns: ColumnMap::default(),
        }
    }

    /// Set the staffing roster
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    /// Set the missed-call classifier rule
    pub fn with_missed_rule(mut self, rule: MissedCallRule) -> Self {
        self.missed_rule = rule;
        self
    }

    /// Set the alias table
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the spike threshold in standard deviations
    pub fn with_anomaly_threshold(mut self, threshold_sigma: f64) -> Self {
        self.anomaly.threshold_sigma = threshold_sigma;
        self
    }

    /// Enable or disable the pre-fan-out missed-call collapse
    pub fn with_dedup_missed(mut self, dedup: bool) -> Self {
        self.dedup_missed = dedup;
        self
    }

    /// Set the start-time parse format
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Set the weekday inclusion set for the matrices
    pub fn with_weekdays(mut self, weekdays: Vec<Weekday>) -> Self {
        self.matrix.weekdays = weekdays;
        self
    }

    /// Fail-fast validation of the whole configuration
    ///
    /// Runs before any data is touched; lookup paths assume a validated
    /// configuration.
    pub fn validate(&self) -> Result<()> {
        self.roster.validate()?;

        if self.timestamp_format.is_empty() {
            return Err(AnalyticsError::invalid_config(
                "timestamp_format must not be empty",
            ));
        }
        if !self.anomaly.threshold_sigma.is_finite() || self.anomaly.threshold_sigma < 0.0 {
            return Err(AnalyticsError::invalid_config(format!(
                "anomaly threshold must be finite and non-negative, got {}",
                self.anomaly.threshold_sigma
            )));
        }
        if self.anomaly.min_samples < 2 {
            return Err(AnalyticsError::invalid_config(
                "anomaly min_samples must be at least 2",
            ));
        }
        if self.matrix.hour_start > self.matrix.hour_end {
            return Err(AnalyticsError::invalid_config(format!(
                "matrix hour range {}..={} is inverted",
                self.matrix.hour_start, self.matrix.hour_end
            )));
        }
        if self.matrix.hour_end > 23 {
            return Err(AnalyticsError::invalid_config(
                "matrix hour_end must be at most 23",
            ));
        }
        if self.matrix.weekdays.is_empty() {
            return Err(AnalyticsError::invalid_config(
                "matrix weekday set must not be empty",
            ));
        }
        Ok(())
    }
}
