//! Snapshot fetcher.
//!
//! Walks a ticker list one symbol at a time, asks the market data provider
//! for each, and assembles the snapshot table. A failed ticker is logged
//! and left out; it never aborts the batch. A fixed pause separates
//! consecutive requests whatever their outcome.

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::data::{MarketDataProvider, RawQuote};
use crate::types::{FetchFailure, SnapshotTable, TickerSnapshot};

/// Result of fetching a batch: the table plus every skipped ticker.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub table: SnapshotTable,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    /// Partition per-ticker outcomes, keeping their order.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<TickerSnapshot, FetchFailure>>,
    {
        let mut report = FetchReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(row) => {
                    report.table.push(row);
                }
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }
}

/// Build a snapshot row from a provider quote.
///
/// Market cap is rescaled to billions; a missing or zero raw value stays
/// unknown. Price prefers the current price and falls back to the regular
/// market price.
pub fn snapshot_row(symbol: &str, quote: RawQuote) -> TickerSnapshot {
    TickerSnapshot {
        ticker: symbol.to_string(),
        current_price: quote.current_price.or(quote.regular_market_price),
        market_cap: quote.market_cap.filter(|&m| m != 0.0).map(|m| m / 1e9),
        revenue_growth_yoy: quote.revenue_growth,
        gross_margin: quote.gross_margin,
        trailing_pe: quote.trailing_pe,
        beta: quote.beta,
    }
}

/// Sequential per-ticker fetcher over one provider.
pub struct SnapshotFetcher {
    provider: Box<dyn MarketDataProvider>,
    pause: Duration,
}

impl SnapshotFetcher {
    pub fn new(provider: Box<dyn MarketDataProvider>, pause: Duration) -> Self {
        Self { provider, pause }
    }

    /// Fetch every ticker in order. Never fails: an all-failed batch is an
    /// empty table.
    pub async fn fetch(&self, tickers: &[String]) -> FetchReport {
        let symbols = Self::unique(tickers);
        info!(
            count = symbols.len(),
            provider = self.provider.name(),
            "Fetching snapshot data"
        );

        let mut outcomes = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            outcomes.push(self.fetch_one(symbol).await);
        }

        let report = FetchReport::from_outcomes(outcomes);
        info!(
            fetched = report.table.len(),
            failed = report.failures.len(),
            "Snapshot fetch complete"
        );
        report
    }

    async fn fetch_one(&self, symbol: &str) -> Result<TickerSnapshot, FetchFailure> {
        match self.provider.fetch_quote(symbol).await {
            Ok(quote) => {
                debug!(ticker = symbol, "Fetched quote");
                Ok(snapshot_row(symbol, quote))
            }
            Err(e) => {
                warn!(ticker = symbol, kind = ?e.kind(), error = %e, "Failed to fetch data");
                Err(FetchFailure {
                    ticker: symbol.to_string(),
                    kind: e.kind(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Drop repeated symbols, keeping the first occurrence.
    fn unique(tickers: &[String]) -> Vec<&str> {
        let mut seen = HashSet::new();
        tickers
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .filter(|t| {
                let fresh = seen.insert(*t);
                if !fresh {
                    debug!(ticker = *t, "Skipping duplicate ticker");
                }
                fresh
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
