//! Core domain types for the screener.
//!
//! Snapshot rows and tables, rule sets, the result bundle returned by the
//! orchestrator, and the crate's error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time metrics for one ticker.
///
/// Every metric is optional: providers routinely omit fields, and an unknown
/// value must stay unknown rather than collapse to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub ticker: String,
    pub current_price: Option<f64>,
    /// Market capitalization in billions of the quote currency.
    pub market_cap: Option<f64>,
    /// Trailing revenue growth as a fraction (0.15 = 15%).
    pub revenue_growth_yoy: Option<f64>,
    /// Gross margin as a fraction.
    pub gross_margin: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub beta: Option<f64>,
}

impl TickerSnapshot {
    /// A row with no known metrics.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            current_price: None,
            market_cap: None,
            revenue_growth_yoy: None,
            gross_margin: None,
            trailing_pe: None,
            beta: None,
        }
    }
}

/// Ordered collection of snapshot rows, unique by ticker.
///
/// Row order is fetch order. Tickers that failed to fetch are simply not
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotTable {
    rows: Vec<TickerSnapshot>,
}

impl SnapshotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Returns `false` (and keeps the existing row) if the
    /// ticker is already present.
    pub fn push(&mut self, row: TickerSnapshot) -> bool {
        if self.contains(&row.ticker) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.rows.iter().any(|r| r.ticker == ticker)
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerSnapshot> {
        self.rows.iter().find(|r| r.ticker == ticker)
    }

    pub fn rows(&self) -> &[TickerSnapshot] {
        &self.rows
    }

    pub fn tickers(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.ticker.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only rows matching `keep`, preserving order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&TickerSnapshot) -> bool,
    {
        self.rows.retain(keep);
    }
}

impl FromIterator<TickerSnapshot> for SnapshotTable {
    fn from_iter<I: IntoIterator<Item = TickerSnapshot>>(iter: I) -> Self {
        let mut table = SnapshotTable::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}

/// Render an optional metric, `-` when unknown.
fn cell(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}

impl fmt::Display for SnapshotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "(empty)");
        }
        writeln!(
            f,
            "{:<8} {:>10} {:>12} {:>10} {:>10} {:>10} {:>8}",
            "ticker", "price", "mcap ($B)", "rev_yoy", "gross_m", "pe_ttm", "beta"
        )?;
        for r in &self.rows {
            writeln!(
                f,
                "{:<8} {:>10} {:>12} {:>10} {:>10} {:>10} {:>8}",
                r.ticker,
                cell(r.current_price, 2),
                cell(r.market_cap, 2),
                cell(r.revenue_growth_yoy, 3),
                cell(r.gross_margin, 3),
                cell(r.trailing_pe, 2),
                cell(r.beta, 2),
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Threshold set for one named screen. A `None` threshold means the field
/// is not filtered on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Minimum market cap, in billions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth_yoy_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_margin_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_max: Option<f64>,
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("market_cap_min", self.market_cap_min),
            ("revenue_growth_yoy_min", self.revenue_growth_yoy_min),
            ("gross_margin_min", self.gross_margin_min),
            ("pe_max", self.pe_max),
            ("beta_max", self.beta_max),
        ]
        .iter()
        .filter_map(|(name, v)| v.map(|v| format!("{name}={v}")))
        .collect();

        if parts.is_empty() {
            write!(f, "(no thresholds)")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch diagnostics
// ---------------------------------------------------------------------------

/// Why a ticker was left out of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    NoData,
    Http,
    Parse,
}

/// A ticker that was skipped during the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub ticker: String,
    pub kind: FailureKind,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything produced by a completed screen.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenResult {
    pub industry_matched: String,
    pub original_tickers: Vec<String>,
    pub snapshot_data: SnapshotTable,
    pub screen_name: String,
    pub screening_rules_applied: RuleSet,
    pub filtered_tickers: Vec<String>,
    pub filtered_data: SnapshotTable,
    pub fetch_failures: Vec<FetchFailure>,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for ScreenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matched industry: {}", self.industry_matched)?;
        writeln!(
            f,
            "Original tickers ({}): {}",
            self.original_tickers.len(),
            self.original_tickers.join(", ")
        )?;
        writeln!(f, "\nSnapshot ({} rows):", self.snapshot_data.len())?;
        write!(f, "{}", self.snapshot_data)?;
        if !self.fetch_failures.is_empty() {
            writeln!(f, "\nSkipped tickers:")?;
            for failure in &self.fetch_failures {
                writeln!(f, "  {} ({:?}): {}", failure.ticker, failure.kind, failure.reason)?;
            }
        }
        writeln!(f, "\nScreen '{}': {}", self.screen_name, self.screening_rules_applied)?;
        writeln!(
            f,
            "\nFiltered tickers ({}): {}",
            self.filtered_tickers.len(),
            self.filtered_tickers.join(", ")
        )?;
        writeln!(f, "\n--- Filtered Results ---")?;
        write!(f, "{}", self.filtered_data)
    }
}

/// An error-only bundle. `industry_matched` is set when resolution
/// succeeded before the run failed.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_matched: Option<String>,
    pub error: String,
}

/// Outcome of one orchestrated run. Never an `Err`: failures become the
/// `Failed` variant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScreenReport {
    Completed(ScreenResult),
    Failed(ScreenFailure),
}

impl ScreenReport {
    pub fn is_completed(&self) -> bool {
        matches!(self, ScreenReport::Completed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScreenReport::Failed(f) => Some(&f.error),
            ScreenReport::Completed(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the screener.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("No matching industry found for '{keyword}'. Available: {available:?}")]
    IndustryNotFound {
        keyword: String,
        available: Vec<String>,
    },

    #[error("Screening rule '{0}' not found in configuration.")]
    RuleSetNotFound(String),

    #[error("No data fetched for tickers.")]
    EmptySnapshot,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
