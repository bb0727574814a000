//! Configuration loading from TOML.
//!
//! Three documents live in one config directory next to the crate:
//! `industry_pool.toml`, `screening_rules.toml` and the optional runtime
//! settings in `screener.toml`. Every call re-reads from disk; nothing is
//! cached between runs.
//!
//! Secrets (the Alpha Vantage key) are referenced by env-var name in the
//! settings file and resolved at runtime via `std::env::var`.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{RuleSet, ScreenerError};

pub const INDUSTRY_POOL_FILE: &str = "industry_pool.toml";
pub const SCREENING_RULES_FILE: &str = "screening_rules.toml";
pub const SETTINGS_FILE: &str = "screener.toml";

/// Overrides the config directory when set.
pub const CONFIG_DIR_ENV: &str = "SCREENER_CONFIG_DIR";

/// Industry name → ordered ticker list, in document order.
pub type IndustryPoolConfig = IndexMap<String, Vec<String>>;

/// Screen name → thresholds, in document order.
pub type ScreeningRulesConfig = IndexMap<String, RuleSet>;

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Reads declarative files by name from a fixed directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The `config/` directory shipped with the crate, unless
    /// `SCREENER_CONFIG_DIR` points elsewhere.
    pub fn from_env() -> Self {
        let dir = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("config"));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and deserialize `name` from the config directory.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, ScreenerError> {
        let path = self.dir.join(name);
        let shown = path.display().to_string();

        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScreenerError::ConfigNotFound {
                path: shown.clone(),
            },
            _ => ScreenerError::ConfigParse {
                path: shown.clone(),
                message: e.to_string(),
            },
        })?;

        let parsed = toml::from_str(&contents).map_err(|e| ScreenerError::ConfigParse {
            path: shown.clone(),
            message: e.message().to_string(),
        })?;

        debug!(path = %shown, "Config loaded");
        Ok(parsed)
    }

    pub fn industry_pool(&self) -> Result<IndustryPoolConfig, ScreenerError> {
        self.load(INDUSTRY_POOL_FILE)
    }

    /// Named rule sets. Top-level entries that are not tables (a stray
    /// `version = 1`) are skipped rather than failing the whole file.
    pub fn screening_rules(&self) -> Result<ScreeningRulesConfig, ScreenerError> {
        let raw: IndexMap<String, toml::Value> = self.load(SCREENING_RULES_FILE)?;

        let mut rules = ScreeningRulesConfig::with_capacity(raw.len());
        for (name, value) in raw {
            if !value.is_table() {
                debug!(entry = %name, "Skipping non-table screening rules entry");
                continue;
            }
            let rule_set: RuleSet =
                value
                    .try_into()
                    .map_err(|e: toml::de::Error| ScreenerError::ConfigParse {
                        path: self.dir.join(SCREENING_RULES_FILE).display().to_string(),
                        message: format!("{name}: {}", e.message()),
                    })?;
            rules.insert(name, rule_set);
        }
        Ok(rules)
    }

    /// Runtime settings. A missing file means defaults; a malformed one is
    /// still an error.
    pub fn settings(&self) -> Result<Settings, ScreenerError> {
        match self.load(SETTINGS_FILE) {
            Err(ScreenerError::ConfigNotFound { path }) => {
                debug!(path = %path, "No settings file, using defaults");
                Ok(Settings::default())
            }
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime settings
// ---------------------------------------------------------------------------

/// Top-level runtime settings (`screener.toml`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    AlphaVantage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Env var holding the Alpha Vantage API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchSettings {
    /// Pause between consecutive per-ticker fetches.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            pause_ms: default_pause_ms(),
        }
    }
}

fn default_api_key_env() -> String {
    "ALPHAVANTAGE_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_pause_ms() -> u64 {
    200
}

impl Settings {
    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
