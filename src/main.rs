//! Industry screener CLI.
//!
//! Entry point. Loads settings, initialises structured logging, builds the
//! configured market data provider, runs one screen and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use industry_screener::config::{ConfigLoader, ProviderKind, Settings};
use industry_screener::data::alpha_vantage::AlphaVantageProvider;
use industry_screener::data::yahoo::YahooProvider;
use industry_screener::data::MarketDataProvider;
use industry_screener::engine::fetcher::SnapshotFetcher;
use industry_screener::engine::orchestrator::{Screener, DEFAULT_SCREEN};
use industry_screener::types::ScreenReport;

/// Screen an industry's ticker pool against a threshold rule set.
#[derive(Debug, Parser)]
#[command(name = "industry-screener", version)]
struct Cli {
    /// Industry keyword (exact or partial industry name).
    #[arg(default_value = "semi")]
    keyword: String,

    /// Rule set from screening_rules.toml to apply.
    #[arg(long, default_value = DEFAULT_SCREEN)]
    screen: String,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let loader = ConfigLoader::from_env();
    let settings = loader.settings()?;
    info!(
        config_dir = %loader.dir().display(),
        provider = ?settings.provider.kind,
        pause_ms = settings.fetch.pause_ms,
        "Industry screener starting"
    );

    let provider = build_provider(&settings)?;
    let fetcher = SnapshotFetcher::new(provider, Duration::from_millis(settings.fetch.pause_ms));
    let screener = Screener::new(loader, fetcher);

    if !cli.json {
        println!("Running screen for: {}", cli.keyword);
    }
    let report = screener.run_with_screen(&cli.keyword, &cli.screen).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        match &report {
            ScreenReport::Completed(result) => println!("\n{result}"),
            ScreenReport::Failed(failure) => {
                println!("\nError or No Results:");
                if let Some(industry) = &failure.industry_matched {
                    println!("  industry_matched: {industry}");
                }
                println!("  error: {}", failure.error);
            }
        }
    }

    Ok(if report.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Construct the market data provider named in the settings.
fn build_provider(settings: &Settings) -> Result<Box<dyn MarketDataProvider>> {
    let timeout = settings.provider.timeout_secs;
    let provider: Box<dyn MarketDataProvider> = match settings.provider.kind {
        ProviderKind::Yahoo => {
            Box::new(YahooProvider::new(timeout).context("Failed to build Yahoo client")?)
        }
        ProviderKind::AlphaVantage => {
            let env_name = &settings.provider.api_key_env;
            let api_key = Settings::resolve_env(env_name).unwrap_or_else(|| {
                warn!(
                    env = %env_name,
                    "No Alpha Vantage key set, using the public demo key (IBM only)"
                );
                "demo".to_string()
            });
            Box::new(
                AlphaVantageProvider::new(api_key, timeout)
                    .context("Failed to build Alpha Vantage client")?,
            )
        }
    };
    Ok(provider)
}

/// Initialise the `tracing` subscriber on stderr so stdout carries only the
/// report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("industry_screener=info"));

    let json_logging = std::env::var("SCREENER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
