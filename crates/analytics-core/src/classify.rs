//! Missed-call classification
//!
//! Two classifier rules appear as intentional product behavior in different
//! deployments, so the rule is a configuration knob rather than a constant:
//!
//! - [`MissedCallRule::ZeroTalkTime`] (the default) marks every
//!   zero-talk-time call as missed, even when an agent name is attached.
//! - [`MissedCallRule::ZeroTalkTimeNoAgent`] only marks zero-talk-time calls
//!   that no agent ever answered.
//!
//! This is the single most consequential behavioral choice in the pipeline:
//! it changes every downstream productivity number, so switching rules must
//! always be an explicit configuration act.

use crate::record::CallRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Rule deciding whether a call record counts as missed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissedCallRule {
    /// Rule A: missed iff talk time is exactly zero
    #[default]
    ZeroTalkTime,
    /// Rule B: missed iff talk time is zero AND no agent name is attached
    ZeroTalkTimeNoAgent,
}

impl MissedCallRule {
    /// Classify a single record
    ///
    /// Unknown talk time (`None`) always classifies as NOT missed: an
    /// unparseable duration must never be coerced into "zero and therefore
    /// missed".
    pub fn is_missed(&self, record: &CallRecord) -> bool {
        match record.talk_time {
            Some(talk) if talk == Duration::ZERO => match self {
                Self::ZeroTalkTime => true,
                Self::ZeroTalkTimeNoAgent => !record.has_agent(),
            },
            Some(_) => false,
            // Unknown duration: conservative default, not missed.
            None => false,
        }
    }
}

impl fmt::Display for MissedCallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTalkTime => write!(f, "zero-talk-time"),
            Self::ZeroTalkTimeNoAgent => write!(f, "zero-talk-time-no-agent"),
        }
    }
}

impl FromStr for MissedCallRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero-talk" | "zero-talk-time" => Ok(Self::ZeroTalkTime),
            "zero-talk-no-agent" | "zero-talk-time-no-agent" => Ok(Self::ZeroTalkTimeNoAgent),
            other => Err(format!(
                "unknown missed-call rule '{other}' (expected 'zero-talk-time' or 'zero-talk-time-no-agent')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(talk: Option<Duration>, agent: &str) -> CallRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        CallRecord::new(0, ts, talk, None, agent.to_string(), agent.to_string())
    }

    #[test]
    fn test_rule_a_flags_zero_talk_with_agent() {
        let r = record(Some(Duration::ZERO), "Jorge Cesar Flores Rivera");
        assert!(MissedCallRule::ZeroTalkTime.is_missed(&r));
    }

    #[test]
    fn test_rule_b_spares_zero_talk_with_agent() {
        let r = record(Some(Duration::ZERO), "Jorge Cesar Flores Rivera");
        assert!(!MissedCallRule::ZeroTalkTimeNoAgent.is_missed(&r));
    }

    #[test]
    fn test_rule_b_flags_zero_talk_without_agent() {
        let r = record(Some(Duration::ZERO), "");
        assert!(MissedCallRule::ZeroTalkTimeNoAgent.is_missed(&r));
    }

    #[test]
    fn test_answered_call_is_not_missed() {
        let r = record(Some(Duration::from_secs(42)), "");
        assert!(!MissedCallRule::ZeroTalkTime.is_missed(&r));
        assert!(!MissedCallRule::ZeroTalkTimeNoAgent.is_missed(&r));
    }

    #[test]
    fn test_unknown_talk_time_is_not_missed() {
        // The explicit unknown branch: never coerce unknown to zero.
        let r = record(None, "");
        assert!(!MissedCallRule::ZeroTalkTime.is_missed(&r));
        assert!(!MissedCallRule::ZeroTalkTimeNoAgent.is_missed(&r));
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!(
            "zero-talk-time".parse::<MissedCallRule>().unwrap(),
            MissedCallRule::ZeroTalkTime
        );
        assert_eq!(
            "Zero-Talk-No-Agent".parse::<MissedCallRule>().unwrap(),
            MissedCallRule::ZeroTalkTimeNoAgent
        );
        assert!("sometimes".parse::<MissedCallRule>().is_err());
    }
}
