//! # Callboard Analytics Core
//!
//! This crate provides the productivity analytics pipeline for the callboard
//! platform: it ingests call-center activity records, attributes missed calls
//! to the agents responsible for coverage, and computes the daily, per-agent,
//! and hourly aggregate tables that reporting front ends render.
//!
//! ## Overview
//!
//! The centerpiece is the missed-call attribution engine. A call with zero
//! talk time is a dropped call, and someone was responsible for answering it:
//! the staffing roster says who. One dropped call during a three-agent
//! coverage window is charged to all three agents, because coverage
//! responsibility is shared; a dropped call outside coverage falls back to
//! whatever agent name the PBX attached, and a record with neither is dropped
//! from attribution (and counted). Every productivity number downstream is a
//! pure rollup of that expansion.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Raw rows (CSV)                      │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ normalize: parse, alias, discard+count
//! ┌────────────────────────────▼─────────────────────────────┐
//! │              NormalizedBatch (immutable, cached)         │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ classify (Rule A / Rule B)
//!                              │ attribute (roster fan-out)
//! ┌────────────────────────────▼─────────────────────────────┐
//! │            Attribution (expanded rows + drop count)      │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ aggregate + detect
//! ┌────────────────────────────▼─────────────────────────────┐
//! │   daily productivity · agent detail · hour×weekday       │
//! │   matrices · talk-time summaries · anomaly alerts        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole pipeline is synchronous and pure: the engine normalizes a source
//! once, caches it keyed on the source identity, and recomputes every
//! aggregate from scratch per report request. There is no shared mutable
//! state to lock.
//!
//! ## Module Organization
//!
//! - [`record`]: raw and normalized record types
//! - [`normalize`]: parsing, alias resolution, discard accounting
//! - [`classify`]: the two missed-call rules
//! - [`roster`]: time-of-day staffing table with overlap validation
//! - [`attribution`]: the fan-out expander (the core algorithm)
//! - [`aggregate`]: daily/per-agent/hourly rollups
//! - [`anomaly`]: volume-spike and coverage-gap detection
//! - [`engine`]: configuration-validated façade with dataset caching
//! - [`schema`]: source column binding for front ends
//! - [`config`]: the configuration surface
//! - [`error`]: error types
//!
//! ## Examples
//!
//! ### End-to-end report
//!
//! ```rust
//! use callboard_analytics_core::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Shift coverage: mornings solo, afternoons shared.
//! let roster = Roster::builder()
//!     .shift(8, 12, ["Jorge Cesar Flores Rivera"])
//!     .shift(12, 16, ["Jorge Cesar Flores Rivera", "Maria Teresa Loredo Morales"])
//!     .build()?;
//!
//! let aliases: AliasTable = [("Jorge", "Jorge Cesar Flores Rivera")].into_iter().collect();
//!
//! let config = AnalyticsConfig::new()
//!     .with_roster(roster)
//!     .with_aliases(aliases);
//!
//! let mut engine = AnalyticsEngine::new(config)?;
//! engine.load(
//!     "export.csv",
//!     vec![
//!         RawRecord {
//!             start_time: "2024-07-01 09:10:00".to_string(),
//!             talk_time: Some("0:03:20".to_string()),
//!             agent_name: Some("Jorge".to_string()),
//!             ..Default::default()
//!         },
//!         RawRecord {
//!             start_time: "2024-07-01 13:05:00".to_string(),
//!             talk_time: Some("0:00:00".to_string()),
//!             ..Default::default()
//!         },
//!     ],
//! );
//!
//! let report = engine.report(&ReportFilter::default())?;
//!
//! // The answered call is attributed to Jorge's canonical name; the missed
//! // afternoon call is charged to both on-duty agents.
//! assert_eq!(report.attributed, 3);
//! let day = report.daily.values().next().unwrap();
//! assert_eq!(day.received, 2);
//! assert_eq!(day.missed, 1);
//! assert_eq!(day.productivity_pct, Some(50.0));
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod anomaly;
pub mod attribution;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod record;
pub mod roster;
pub mod schema;

pub mod prelude;

pub use config::AnalyticsConfig;
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
