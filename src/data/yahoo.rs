//! Yahoo Finance provider.
//!
//! Reads the `financialData`, `summaryDetail` and `price` modules of the
//! `quoteSummary` endpoint, which together carry every metric the screen
//! needs.
//!
//! API: `https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}`
//! Auth: session cookie from `fc.yahoo.com` plus a crumb from
//! `/v1/test/getcrumb`, obtained once per client.
//! Rate limit: undocumented; throttled requests come back as HTTP 429.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{http_client, MarketDataProvider, ProviderError, RawQuote};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const MODULES: &str = "financialData,summaryDetail,price";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    price: Option<PriceModule>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; missing values
/// are `{}`. `raw` is occasionally a string such as `"Infinity"`.
#[derive(Debug, Default, Deserialize)]
struct YahooValue {
    #[serde(default)]
    raw: Option<serde_json::Value>,
}

impl YahooValue {
    fn value(v: &Option<YahooValue>) -> Option<f64> {
        v.as_ref()
            .and_then(|v| v.raw.as_ref())
            .and_then(serde_json::Value::as_f64)
            .filter(|x| x.is_finite())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    current_price: Option<YahooValue>,
    #[serde(default)]
    revenue_growth: Option<YahooValue>,
    #[serde(default)]
    gross_margins: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    market_cap: Option<YahooValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<YahooValue>,
    #[serde(default)]
    beta: Option<YahooValue>,
    #[serde(default)]
    regular_market_price: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    regular_market_price: Option<YahooValue>,
    #[serde(default)]
    market_cap: Option<YahooValue>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance `quoteSummary` client.
pub struct YahooProvider {
    http: Client,
    crumb: OnceCell<String>,
}

impl YahooProvider {
    pub fn new(timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(timeout_secs, true)?,
            crumb: OnceCell::new(),
        })
    }

    /// Establish the session cookie and fetch a crumb (first call only).
    async fn crumb(&self) -> Result<&str, ProviderError> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // fc.yahoo.com answers 404 but still sets the session cookie.
                let _ = self.http.get(COOKIE_URL).send().await?;

                let resp = self
                    .http
                    .get(format!("{BASE_URL}/v1/test/getcrumb"))
                    .send()
                    .await?;
                let status = resp.status();
                let body = resp.text().await?;

                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(ProviderError::RateLimited(body));
                }
                if !status.is_success() || body.trim().is_empty() {
                    return Err(ProviderError::Status { status, body });
                }
                debug!("Yahoo crumb acquired");
                Ok::<_, ProviderError>(body.trim().to_string())
            })
            .await?;
        Ok(crumb.as_str())
    }

    /// Classify a `quoteSummary` response status. 404 carries an error
    /// payload naming the symbol, so it is left for `parse_summary`.
    fn check_status(symbol: &str, status: StatusCode, body: &str) -> Result<(), ProviderError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(format!("{symbol}: {body}")));
        }
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ProviderError::Status {
                status,
                body: body.to_string(),
            });
        }
        Ok(())
    }

    /// Turn a `quoteSummary` body into a quote.
    fn parse_summary(symbol: &str, body: &str) -> Result<RawQuote, ProviderError> {
        let envelope: SummaryEnvelope = serde_json::from_str(body)
            .map_err(|e| ProviderError::Parse(format!("{symbol}: {e}")))?;

        if let Some(err) = envelope.quote_summary.error {
            return Err(ProviderError::NoData(format!(
                "{symbol} ({}: {})",
                err.code, err.description
            )));
        }

        let result = envelope
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

        let financial = result.financial_data.unwrap_or_default();
        let summary = result.summary_detail.unwrap_or_default();
        let price = result.price.unwrap_or_default();

        Ok(RawQuote {
            current_price: YahooValue::value(&financial.current_price),
            regular_market_price: YahooValue::value(&price.regular_market_price)
                .or_else(|| YahooValue::value(&summary.regular_market_price)),
            market_cap: YahooValue::value(&summary.market_cap)
                .or_else(|| YahooValue::value(&price.market_cap)),
            revenue_growth: YahooValue::value(&financial.revenue_growth),
            gross_margin: YahooValue::value(&financial.gross_margins),
            trailing_pe: YahooValue::value(&summary.trailing_pe),
            beta: YahooValue::value(&summary.beta),
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{BASE_URL}/v10/finance/quoteSummary/{}?modules={MODULES}&crumb={}",
            urlencoding::encode(symbol),
            urlencoding::encode(crumb),
        );

        debug!(symbol, "Fetching Yahoo quoteSummary");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        Self::check_status(symbol, status, &body)?;
        Self::parse_summary(symbol, &body)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
