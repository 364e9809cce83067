//! Convenient re-exports for typical embedders
//!
//! ```rust
//! use callboard_analytics_core::prelude::*;
//! ```

pub use crate::aggregate::{
    agent_daily_detail, daily_productivity, hour_by_weekday_matrix, talk_time_summary,
    AgentDailyDetail, DailyProductivity, HourWeekdayMatrix, TalkTimeSummary,
};
pub use crate::anomaly::{detect, Anomaly};
pub use crate::attribution::{attribute, AttributedRecord, Attribution};
pub use crate::classify::MissedCallRule;
pub use crate::config::{AliasTable, AnalyticsConfig, AnomalyConfig, MatrixConfig};
pub use crate::engine::{
    run_pipeline, AgentDailyRow, AnalyticsEngine, AnalyticsReport, ReportFilter,
};
pub use crate::error::{AnalyticsError, Result};
pub use crate::normalize::{normalize, parse_duration, NormalizedBatch};
pub use crate::record::{CallRecord, RawRecord};
pub use crate::roster::{Roster, RosterBuilder, Shift};
pub use crate::schema::{BoundColumns, ColumnMap};
