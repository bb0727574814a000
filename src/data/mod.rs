//! Market data providers.
//!
//! Defines the `MarketDataProvider` trait and the provider-neutral quote
//! shape, with implementations for Yahoo Finance and Alpha Vantage.

pub mod alpha_vantage;
pub mod yahoo;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::types::FailureKind;

/// Raw per-ticker metrics as reported by a provider.
///
/// Values are in provider units: market cap is in whole currency units,
/// ratios are fractions. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuote {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub gross_margin: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub beta: Option<f64>,
}

/// Provider-level failures for a single symbol.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("no data for {0}")]
    NoData(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Diagnostic classification used in the fetch report.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::RateLimited(_) => FailureKind::RateLimited,
            ProviderError::NoData(_) => FailureKind::NoData,
            ProviderError::Parse(_) => FailureKind::Parse,
            ProviderError::Http(_) | ProviderError::Status { .. } => FailureKind::Http,
        }
    }
}

/// Abstraction over external market data sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch a snapshot of metrics for one symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Build the shared HTTP client used by the providers.
pub(crate) fn http_client(
    timeout_secs: u64,
    cookies: bool,
) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) industry-screener/0.1.0")
        .cookie_store(cookies)
        .build()?;
    Ok(client)
}
