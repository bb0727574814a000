//! Screen applicator.
//!
//! Applies a named rule set to a snapshot table. Each present threshold is
//! an independent row filter; they run in a fixed order and each narrows
//! the surviving subset. Unknown values never pass a threshold.

use tracing::{debug, info};

use crate::config::ConfigLoader;
use crate::types::{RuleSet, ScreenerError, SnapshotTable, TickerSnapshot};

/// A single active threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    MarketCapMin(f64),
    RevenueGrowthMin(f64),
    GrossMarginMin(f64),
    /// Also requires a known P/E: loss-making companies usually report none.
    PeMax(f64),
    BetaMax(f64),
}

impl Threshold {
    pub fn name(&self) -> &'static str {
        match self {
            Threshold::MarketCapMin(_) => "market_cap_min",
            Threshold::RevenueGrowthMin(_) => "revenue_growth_yoy_min",
            Threshold::GrossMarginMin(_) => "gross_margin_min",
            Threshold::PeMax(_) => "pe_max",
            Threshold::BetaMax(_) => "beta_max",
        }
    }

    /// Whether `row` survives this threshold.
    pub fn keeps(&self, row: &TickerSnapshot) -> bool {
        match *self {
            Threshold::MarketCapMin(t) => at_least(row.market_cap, t),
            Threshold::RevenueGrowthMin(t) => at_least(row.revenue_growth_yoy, t),
            Threshold::GrossMarginMin(t) => at_least(row.gross_margin, t),
            Threshold::PeMax(t) => row.trailing_pe.is_some() && at_most(row.trailing_pe, t),
            Threshold::BetaMax(t) => at_most(row.beta, t),
        }
    }
}

fn at_least(value: Option<f64>, threshold: f64) -> bool {
    value.map_or(false, |v| v >= threshold)
}

fn at_most(value: Option<f64>, threshold: f64) -> bool {
    value.map_or(false, |v| v <= threshold)
}

impl RuleSet {
    /// Active thresholds in application order.
    pub fn thresholds(&self) -> Vec<Threshold> {
        [
            self.market_cap_min.map(Threshold::MarketCapMin),
            self.revenue_growth_yoy_min.map(Threshold::RevenueGrowthMin),
            self.gross_margin_min.map(Threshold::GrossMarginMin),
            self.pe_max.map(Threshold::PeMax),
            self.beta_max.map(Threshold::BetaMax),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply every active threshold to `snapshot`, preserving row order.
    pub fn filter(&self, snapshot: &SnapshotTable) -> SnapshotTable {
        let mut working = snapshot.clone();
        for threshold in self.thresholds() {
            working.retain(|row| threshold.keeps(row));
            debug!(
                filter = threshold.name(),
                remaining = working.len(),
                "Applied filter"
            );
        }
        working
    }
}

/// A rule set applied to a snapshot.
#[derive(Debug, Clone)]
pub struct AppliedScreen {
    pub name: String,
    pub rules: RuleSet,
    pub filtered: SnapshotTable,
}

/// Loads rule sets by name and applies them.
pub struct ScreenApplicator<'a> {
    loader: &'a ConfigLoader,
}

impl<'a> ScreenApplicator<'a> {
    pub fn new(loader: &'a ConfigLoader) -> Self {
        Self { loader }
    }

    /// Look up `screen_name` (fresh from disk) and filter `snapshot` by it.
    pub fn apply(
        &self,
        snapshot: &SnapshotTable,
        screen_name: &str,
    ) -> Result<AppliedScreen, ScreenerError> {
        let mut rules_config = self.loader.screening_rules()?;
        let rules = rules_config
            .shift_remove(screen_name)
            .ok_or_else(|| ScreenerError::RuleSetNotFound(screen_name.to_string()))?;

        info!(screen = screen_name, rules = %rules, "Applying screen");
        let filtered = rules.filter(snapshot);
        info!(
            screen = screen_name,
            input = snapshot.len(),
            passed = filtered.len(),
            "Screen applied"
        );

        Ok(AppliedScreen {
            name: screen_name.to_string(),
            rules,
            filtered,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
