//! `callboard` - command-line reporting for call-center activity exports
//!
//! Reads a CSV export, runs the analytics pipeline, and renders the
//! productivity tables, hour-by-weekday matrices, talk-time summaries, and
//! anomaly alerts. Column names, the staffing roster, aliases, and thresholds
//! come from an optional TOML configuration file; a handful of flags override
//! the most common knobs per invocation.

use anyhow::{Context, Result};
use callboard_analytics_core::prelude::*;
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "callboard",
    about = "Call-center productivity and missed-call attribution reports",
    version
)]
struct Cli {
    /// CSV export to analyze
    input: PathBuf,

    /// TOML configuration file (roster, aliases, columns, thresholds)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// First date to include (inclusive), e.g. 2024-07-01
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date to include (inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Focus the per-agent tables on one canonical agent name
    #[arg(long)]
    agent: Option<String>,

    /// Missed-call rule: zero-talk-time or zero-talk-time-no-agent
    #[arg(long)]
    rule: Option<MissedCallRule>,

    /// Collapse missed calls sharing (start time, raw agent) before fan-out
    #[arg(long)]
    dedup_missed: bool,

    /// Emit the full report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<AnalyticsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("parsing configuration {}", path.display()))?
        }
        None => AnalyticsConfig::new(),
    };

    if let Some(rule) = cli.rule {
        config.missed_rule = rule;
    }
    if cli.dedup_missed {
        config.dedup_missed = true;
    }
    Ok(config)
}

fn read_rows(cli: &Cli, columns: &ColumnMap) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();
    let bound = columns.bind(&headers)?;
    debug!(?headers, "bound input columns");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("reading CSV row")?;
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        rows.push(bound.raw_record(&fields));
    }
    Ok(rows)
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |pct| format!("{pct:.2}"))
}

fn fmt_secs(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |secs| format!("{secs:.2}"))
}

#[derive(Tabled)]
struct DailyTableRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Weekday")]
    weekday: String,
    #[tabled(rename = "Received")]
    received: u64,
    #[tabled(rename = "Missed")]
    missed: u64,
    #[tabled(rename = "Productivity %")]
    productivity: String,
    #[tabled(rename = "Abandonment %")]
    abandonment: String,
}

#[derive(Tabled)]
struct AgentTableRow {
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Total")]
    total: u64,
    #[tabled(rename = "Missed")]
    missed: u64,
    #[tabled(rename = "Attended")]
    attended: u64,
    #[tabled(rename = "Productivity %")]
    productivity: String,
    #[tabled(rename = "Avg Talk (s)")]
    avg_talk: String,
    #[tabled(rename = "Avg Ring (s)")]
    avg_ring: String,
}

#[derive(Tabled)]
struct TalkTimeTableRow {
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Attended Calls")]
    calls: u64,
    #[tabled(rename = "Mean (s)")]
    mean: String,
    #[tabled(rename = "Min (s)")]
    min: String,
    #[tabled(rename = "Max (s)")]
    max: String,
}

fn render_daily(report: &AnalyticsReport) {
    println!("{}", "Daily productivity".bold());
    let rows: Vec<DailyTableRow> = report
        .daily
        .iter()
        .map(|(date, day)| DailyTableRow {
            date: date.to_string(),
            weekday: date.weekday().to_string(),
            received: day.received,
            missed: day.missed,
            productivity: fmt_pct(day.productivity_pct),
            abandonment: fmt_pct(day.abandonment_pct),
        })
        .collect();
    println!("{}\n", Table::new(rows).with(Style::sharp()));
}

fn render_agent_detail(report: &AnalyticsReport) {
    println!("{}", "Per-agent daily detail".bold());
    let rows: Vec<AgentTableRow> = report
        .agent_detail
        .iter()
        .map(|row| AgentTableRow {
            agent: row.agent.clone(),
            date: row.date.to_string(),
            total: row.detail.total,
            missed: row.detail.missed,
            attended: row.detail.attended,
            productivity: fmt_pct(row.detail.productivity_pct),
            avg_talk: fmt_secs(row.detail.avg_talk_seconds),
            avg_ring: fmt_secs(row.detail.avg_ring_seconds),
        })
        .collect();
    println!("{}\n", Table::new(rows).with(Style::sharp()));
}

fn render_matrix(title: &str, matrix: &HourWeekdayMatrix) {
    println!("{}", title.bold());
    let mut builder = Builder::default();
    let mut header = vec!["Hour".to_string()];
    header.extend(matrix.weekdays.iter().map(|weekday| weekday.to_string()));
    builder.push_record(header);
    for (index, hour) in matrix.hours.iter().enumerate() {
        let mut row = vec![format!("{hour:02}:00")];
        row.extend(matrix.row(index).iter().map(u64::to_string));
        builder.push_record(row);
    }
    println!("{}\n", builder.build().with(Style::sharp()));
}

fn render_talk_time(report: &AnalyticsReport) {
    println!("{}", "Attended talk time per agent".bold());
    let rows: Vec<TalkTimeTableRow> = report
        .talk_time
        .iter()
        .map(|(agent, summary)| TalkTimeTableRow {
            agent: agent.clone(),
            calls: summary.calls,
            mean: fmt_secs(summary.mean_seconds),
            min: fmt_secs(summary.min_seconds),
            max: fmt_secs(summary.max_seconds),
        })
        .collect();
    println!("{}\n", Table::new(rows).with(Style::sharp()));
}

fn render_anomalies(report: &AnalyticsReport) {
    println!("{}", "Alerts".bold());
    if report.anomalies.is_empty() {
        println!("{}\n", "No volume spikes or coverage gaps detected.".green());
        return;
    }
    for anomaly in &report.anomalies {
        println!("{}", format!("warning: {anomaly}").yellow());
    }
    println!();
}

fn render(report: &AnalyticsReport) {
    render_daily(report);
    render_agent_detail(report);
    render_matrix("Calls by hour and weekday", &report.call_matrix);
    render_matrix("Missed calls by hour and weekday (attributed)", &report.missed_matrix);
    render_talk_time(report);
    render_anomalies(report);

    println!(
        "{} attributed rows, {} dropped, {} rows discarded for bad timestamps",
        report.attributed, report.dropped, report.discarded_rows
    );
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let rows = read_rows(&cli, &config.columns)?;

    let mut engine = AnalyticsEngine::new(config)?;
    engine.load(&cli.input.display().to_string(), rows);

    let filter = ReportFilter {
        from: cli.from,
        to: cli.to,
        agent: cli.agent.clone(),
    };
    let report = engine.report(&filter)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render(&report);
    }
    Ok(())
}
