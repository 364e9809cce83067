//! Staffing roster: time-of-day coverage lookup
//!
//! The roster is static configuration, not derived from the call log. It maps
//! each hour of the day to the ordered set of agents responsible for coverage
//! during that hour, via half-open hour ranges (`start <= hour < end`).
//!
//! Overlap handling is the important contract here: two shifts claiming the
//! same hour would make attribution ambiguous, so the roster rejects overlaps
//! at build time with a descriptive error. Lookup never has to pick between
//! candidate ranges.
//!
//! Agent ordering within a shift is insertion order. It carries no priority
//! meaning; it only makes attribution fan-out deterministic.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One coverage shift: a half-open hour range and the agents on duty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// First covered hour (inclusive), 0-23
    pub start: u8,
    /// End hour (exclusive), 1-24
    pub end: u8,
    /// Agents sharing responsibility during this shift, in fan-out order
    pub agents: Vec<String>,
}

impl Shift {
    /// Whether this shift covers the given hour
    pub fn covers(&self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Validated time-of-day staffing table
///
/// Construct with [`Roster::builder`] or deserialize the entry list and call
/// [`Roster::validate`] before first use; [`crate::AnalyticsEngine::new`]
/// validates the configured roster for you.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    shifts: Vec<Shift>,
}

impl Roster {
    /// Start building a roster
    pub fn builder() -> RosterBuilder {
        RosterBuilder { shifts: Vec::new() }
    }

    /// Build a roster directly from shift entries, validating them
    pub fn from_shifts(shifts: Vec<Shift>) -> Result<Self> {
        let roster = Self { shifts };
        roster.validate()?;
        Ok(roster)
    }

    /// Check every shift for malformed ranges and pairwise overlaps
    ///
    /// Called at configuration-load time; lookups assume a validated roster.
    pub fn validate(&self) -> Result<()> {
        for shift in &self.shifts {
            if shift.start >= shift.end {
                return Err(AnalyticsError::invalid_shift(
                    shift.to_string(),
                    "start hour must be before end hour",
                ));
            }
            if shift.end > 24 {
                return Err(AnalyticsError::invalid_shift(
                    shift.to_string(),
                    "end hour must be at most 24",
                ));
            }
            if shift.agents.is_empty() {
                return Err(AnalyticsError::invalid_shift(
                    shift.to_string(),
                    "shift has no agents",
                ));
            }
        }
        for (i, a) in self.shifts.iter().enumerate() {
            for b in &self.shifts[i + 1..] {
                if a.start < b.end && b.start < a.end {
                    return Err(AnalyticsError::RosterOverlap {
                        hour: a.start.max(b.start),
                        first: a.to_string(),
                        second: b.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Agents responsible for coverage during the given hour
    ///
    /// Returns the empty slice for hours outside every shift.
    pub fn agents_on_duty(&self, hour: u8) -> &[String] {
        self.shifts
            .iter()
            .find(|shift| shift.covers(hour))
            .map(|shift| shift.agents.as_slice())
            .unwrap_or(&[])
    }

    /// All configured shifts, in insertion order
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Whether the roster has any coverage at all
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// Builder for [`Roster`]
#[derive(Debug, Default)]
pub struct RosterBuilder {
    shifts: Vec<Shift>,
}

impl RosterBuilder {
    /// Add a coverage shift for `start..end` (half-open hours)
    pub fn shift<S: Into<String>>(mut self, start: u8, end: u8, agents: impl IntoIterator<Item = S>) -> Self {
        self.shifts.push(Shift {
            start,
            end,
            agents: agents.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Validate and produce the roster
    pub fn build(self) -> Result<Roster> {
        Roster::from_shifts(self.shifts)
    }
}
