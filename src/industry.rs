//! Industry resolution.
//!
//! Maps a free-text keyword onto one key of the industry pool. Exact
//! (case-insensitive) matches win; otherwise the first key in document
//! order that contains the keyword, or is contained by it, is selected.

use tracing::info;

use crate::config::{ConfigLoader, IndustryPoolConfig};
use crate::types::ScreenerError;

/// A resolved industry and its ticker pool.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryMatch {
    pub industry: String,
    pub tickers: Vec<String>,
}

/// In-memory industry pool.
#[derive(Debug, Clone)]
pub struct IndustryPool {
    entries: IndustryPoolConfig,
}

impl IndustryPool {
    pub fn new(entries: IndustryPoolConfig) -> Self {
        Self { entries }
    }

    /// Read the pool fresh from the config directory.
    pub fn load(loader: &ConfigLoader) -> Result<Self, ScreenerError> {
        Ok(Self::new(loader.industry_pool()?))
    }

    /// Industry names in document order.
    pub fn industries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Resolve `keyword` to an industry and its tickers.
    pub fn resolve(&self, keyword: &str) -> Result<IndustryMatch, ScreenerError> {
        let normalized = keyword.trim().to_lowercase();

        let matched = if normalized.is_empty() {
            None
        } else {
            self.exact_match(&normalized)
                .or_else(|| self.substring_match(&normalized))
        };

        match matched {
            Some((key, tickers)) => {
                info!(industry = %key, keyword = %keyword, "Matched industry");
                Ok(IndustryMatch {
                    industry: key.clone(),
                    tickers: tickers.clone(),
                })
            }
            None => Err(ScreenerError::IndustryNotFound {
                keyword: keyword.to_string(),
                available: self.industries(),
            }),
        }
    }

    fn exact_match(&self, normalized: &str) -> Option<(&String, &Vec<String>)> {
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == normalized)
    }

    fn substring_match(&self, normalized: &str) -> Option<(&String, &Vec<String>)> {
        self.entries.iter().find(|(key, _)| {
            let key = key.to_lowercase();
            key.contains(normalized) || normalized.contains(key.as_str())
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
