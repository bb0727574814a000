//! Mock market data provider for integration testing.
//!
//! Serves fixed quotes from memory, records every symbol requested, and
//! can be told to fail specific symbols or everything.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use industry_screener::data::{MarketDataProvider, ProviderError, RawQuote};

/// How a forced failure should present itself.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    RateLimited,
    NoData,
}

/// A deterministic `MarketDataProvider`.
///
/// Clones share the call log, so a test can keep a handle after moving
/// the provider into a fetcher.
#[derive(Clone, Default)]
pub struct MockProvider {
    quotes: HashMap<String, RawQuote>,
    failures: HashMap<String, Failure>,
    fail_all: Option<Failure>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quote. Market cap is given in billions for readability
    /// and stored in raw currency units, as a real provider would send it.
    pub fn with_quote(mut self, symbol: &str, market_cap_b: Option<f64>, pe: Option<f64>) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            RawQuote {
                current_price: Some(100.0),
                market_cap: market_cap_b.map(|b| b * 1e9),
                trailing_pe: pe,
                ..RawQuote::default()
            },
        );
        self
    }

    /// Register a fully specified raw quote.
    pub fn with_raw(mut self, symbol: &str, quote: RawQuote) -> Self {
        self.quotes.insert(symbol.to_string(), quote);
        self
    }

    pub fn failing(mut self, symbol: &str, failure: Failure) -> Self {
        self.failures.insert(symbol.to_string(), failure);
        self
    }

    pub fn failing_all(mut self, failure: Failure) -> Self {
        self.fail_all = Some(failure);
        self
    }

    /// Symbols requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn error(symbol: &str, failure: Failure) -> ProviderError {
        match failure {
            Failure::RateLimited => ProviderError::RateLimited(format!("{symbol}: 429")),
            Failure::NoData => ProviderError::NoData(symbol.to_string()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        self.calls.lock().unwrap().push(symbol.to_string());

        if let Some(failure) = self.fail_all.or_else(|| self.failures.get(symbol).copied()) {
            return Err(Self::error(symbol, failure));
        }
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::NoData(symbol.to_string()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_and_records() {
        let mock = MockProvider::new().with_quote("AAA", Some(50.0), Some(20.0));
        let quote = mock.fetch_quote("AAA").await.unwrap();
        assert_eq!(quote.market_cap, Some(50e9));
        assert!(mock.fetch_quote("ZZZ").await.is_err());
        assert_eq!(mock.calls(), vec!["AAA", "ZZZ"]);
    }

    #[tokio::test]
    async fn test_mock_forced_failure() {
        let mock = MockProvider::new()
            .with_quote("AAA", Some(1.0), None)
            .failing("AAA", Failure::RateLimited);
        let err = mock.fetch_quote("AAA").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }
}
