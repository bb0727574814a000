//! Alpha Vantage provider.
//!
//! Combines the `OVERVIEW` fundamentals document with `GLOBAL_QUOTE` for
//! the latest price. Every value arrives as a string; `"None"`, `"-"` and
//! empty strings mean unknown.
//!
//! API: `https://www.alphavantage.co/query?function=...&symbol=...&apikey=...`
//! Rate limit: throttled calls still return 200, with a `Note` or
//! `Information` message in place of data.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::{http_client, MarketDataProvider, ProviderError, RawQuote};

const BASE_URL: &str = "https://www.alphavantage.co/query";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct Overview {
    #[serde(rename = "MarketCapitalization", default)]
    market_capitalization: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY", default)]
    quarterly_revenue_growth_yoy: Option<String>,
    #[serde(rename = "GrossProfitTTM", default)]
    gross_profit_ttm: Option<String>,
    #[serde(rename = "RevenueTTM", default)]
    revenue_ttm: Option<String>,
    #[serde(rename = "TrailingPE", default)]
    trailing_pe: Option<String>,
    #[serde(rename = "Beta", default)]
    beta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote", default)]
    global_quote: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Alpha Vantage client (`OVERVIEW` + `GLOBAL_QUOTE`).
pub struct AlphaVantageProvider {
    http: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(timeout_secs, false)?,
            api_key,
        })
    }

    /// Call one query function and return the JSON body, classifying
    /// throttle notices.
    async fn query(&self, function: &str, symbol: &str) -> Result<Value, ProviderError> {
        let url = format!(
            "{BASE_URL}?function={function}&symbol={}&apikey={}",
            urlencoding::encode(symbol),
            urlencoding::encode(&self.api_key),
        );

        debug!(function, symbol, "Fetching Alpha Vantage");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        Self::check_status(symbol, status, &body)?;
        Self::check_payload(function, symbol, &body)
    }

    /// Reject non-success statuses; 429 is a throttle, the rest are HTTP
    /// failures.
    fn check_status(symbol: &str, status: StatusCode, body: &str) -> Result<(), ProviderError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(format!("{symbol}: {body}")));
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status,
                body: body.to_string(),
            });
        }
        Ok(())
    }

    /// Parse a body and reject throttle or error payloads.
    ///
    /// `Note` and `Information` share one shape for throttling and for key
    /// problems (the `demo` key, a missing or invalid key). Only the
    /// throttle wording counts as rate limiting.
    fn check_payload(function: &str, symbol: &str, body: &str) -> Result<Value, ProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("{function} {symbol}: {e}")))?;

        for key in ["Note", "Information"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return Err(if Self::is_key_notice(msg) {
                    ProviderError::NoData(format!("{symbol}: {msg}"))
                } else {
                    ProviderError::RateLimited(msg.to_string())
                });
            }
        }
        if let Some(msg) = value.get("Error Message").and_then(Value::as_str) {
            return Err(ProviderError::NoData(format!("{symbol}: {msg}")));
        }
        Ok(value)
    }

    fn is_key_notice(msg: &str) -> bool {
        let msg = msg.to_ascii_lowercase();
        ["demo", "api key", "apikey"]
            .iter()
            .any(|needle| msg.contains(needle))
            && !msg.contains("rate limit")
    }

    /// An unknown symbol yields `{}` for `OVERVIEW` rather than an error.
    fn require_listing(symbol: &str, overview: Value) -> Result<Value, ProviderError> {
        if overview.get("Symbol").is_none() {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        Ok(overview)
    }

    /// Alpha Vantage number strings; placeholders map to `None`.
    fn number(field: &Option<String>) -> Option<f64> {
        let s = field.as_deref()?.trim();
        match s {
            "" | "None" | "-" => None,
            _ => s.trim_end_matches('%').parse::<f64>().ok().filter(|x| x.is_finite()),
        }
    }

    fn build_quote(overview: Value, quote: Value) -> Result<RawQuote, ProviderError> {
        let overview: Overview = serde_json::from_value(overview)
            .map_err(|e| ProviderError::Parse(format!("OVERVIEW: {e}")))?;
        let quote: GlobalQuoteEnvelope = serde_json::from_value(quote)
            .map_err(|e| ProviderError::Parse(format!("GLOBAL_QUOTE: {e}")))?;

        let gross_margin = match (
            Self::number(&overview.gross_profit_ttm),
            Self::number(&overview.revenue_ttm),
        ) {
            (Some(gross), Some(revenue)) if revenue != 0.0 => Some(gross / revenue),
            _ => None,
        };

        Ok(RawQuote {
            current_price: Self::number(&quote.global_quote.get("05. price").cloned()),
            regular_market_price: None,
            market_cap: Self::number(&overview.market_capitalization),
            revenue_growth: Self::number(&overview.quarterly_revenue_growth_yoy),
            gross_margin,
            trailing_pe: Self::number(&overview.trailing_pe),
            beta: Self::number(&overview.beta),
        })
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        let overview = Self::require_listing(symbol, self.query("OVERVIEW", symbol).await?)?;
        let quote = self.query("GLOBAL_QUOTE", symbol).await?;
        Self::build_quote(overview, quote)
    }

    fn name(&self) -> &'static str {
        "alpha_vantage"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
