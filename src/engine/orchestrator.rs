//! Screen orchestrator.
//!
//! Resolve industry → fetch snapshot → apply one named screen → bundle.
//! Every failure is logged and folded into a `ScreenReport::Failed`; a run
//! never returns an error to its caller.

use chrono::Utc;
use tracing::{error, info, info_span, Instrument};

use crate::config::ConfigLoader;
use crate::engine::fetcher::SnapshotFetcher;
use crate::industry::IndustryPool;
use crate::screen::ScreenApplicator;
use crate::types::{ScreenFailure, ScreenReport, ScreenResult, ScreenerError};

/// Rule set applied by [`Screener::run`].
pub const DEFAULT_SCREEN: &str = "growth_tech_screen";

/// Composes resolver, fetcher and applicator over one config directory.
pub struct Screener {
    loader: ConfigLoader,
    fetcher: SnapshotFetcher,
}

impl Screener {
    pub fn new(loader: ConfigLoader, fetcher: SnapshotFetcher) -> Self {
        Self { loader, fetcher }
    }

    /// Screen the industry matching `keyword` with the default rule set.
    pub async fn run(&self, keyword: &str) -> ScreenReport {
        self.run_with_screen(keyword, DEFAULT_SCREEN).await
    }

    /// Screen the industry matching `keyword` with the rule set `screen`.
    pub async fn run_with_screen(&self, keyword: &str, screen: &str) -> ScreenReport {
        let span = info_span!("screen", keyword, screen);
        self.execute(keyword, screen).instrument(span).await
    }

    async fn execute(&self, keyword: &str, screen: &str) -> ScreenReport {
        // 1. Resolve industry (pool is re-read every run)
        let industry = match IndustryPool::load(&self.loader).and_then(|pool| pool.resolve(keyword))
        {
            Ok(m) => m,
            Err(e) => return Self::failed(None, e),
        };

        // 2. Fetch snapshot
        let fetched = self.fetcher.fetch(&industry.tickers).await;
        if fetched.table.is_empty() {
            return Self::failed(Some(industry.industry), ScreenerError::EmptySnapshot);
        }

        // 3. Apply screen
        let applied = match ScreenApplicator::new(&self.loader).apply(&fetched.table, screen) {
            Ok(a) => a,
            Err(e) => return Self::failed(None, e),
        };

        // 4. Bundle
        info!(
            industry = %industry.industry,
            tickers = industry.tickers.len(),
            snapshot = fetched.table.len(),
            passed = applied.filtered.len(),
            "Screen complete"
        );

        ScreenReport::Completed(ScreenResult {
            industry_matched: industry.industry,
            original_tickers: industry.tickers,
            snapshot_data: fetched.table,
            screen_name: applied.name,
            screening_rules_applied: applied.rules,
            filtered_tickers: applied.filtered.tickers(),
            filtered_data: applied.filtered,
            fetch_failures: fetched.failures,
            generated_at: Utc::now(),
        })
    }

    fn failed(industry_matched: Option<String>, e: ScreenerError) -> ScreenReport {
        error!(error = %e, "Screening failed");
        ScreenReport::Failed(ScreenFailure {
            industry_matched,
            error: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
