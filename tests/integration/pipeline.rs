//! End-to-end screening scenarios.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use industry_screener::config::{ConfigLoader, INDUSTRY_POOL_FILE, SCREENING_RULES_FILE};
use industry_screener::data::RawQuote;
use industry_screener::engine::fetcher::SnapshotFetcher;
use industry_screener::engine::orchestrator::Screener;
use industry_screener::industry::IndustryPool;
use industry_screener::screen::ScreenApplicator;
use industry_screener::types::{FailureKind, ScreenReport, ScreenResult};

use crate::mock_provider::{Failure, MockProvider};

const POOL: &str = r#"
semiconductors = ["AAA", "BBB", "CCC"]
"cloud software" = ["CRM", "NOW"]
"#;

const RULES: &str = r#"
[growth_tech_screen]
market_cap_min = 10
pe_max = 30

[quality_screen]
market_cap_min = 10
gross_margin_min = 0.5
"#;

/// Throwaway config directory, removed on drop.
struct TempConfig {
    dir: PathBuf,
}

impl TempConfig {
    fn new(pool: &str, rules: &str) -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("screener_it_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(INDUSTRY_POOL_FILE), pool).unwrap();
        fs::write(dir.join(SCREENING_RULES_FILE), rules).unwrap();
        Self { dir }
    }

    fn loader(&self) -> ConfigLoader {
        ConfigLoader::new(&self.dir)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn scenario_provider() -> MockProvider {
    MockProvider::new()
        .with_quote("AAA", Some(50.0), Some(20.0))
        .with_quote("BBB", Some(5.0), Some(10.0))
        .with_quote("CCC", Some(60.0), None)
}

fn screener(config: &TempConfig, provider: MockProvider) -> Screener {
    Screener::new(
        config.loader(),
        SnapshotFetcher::new(Box::new(provider), Duration::ZERO),
    )
}

fn completed(report: ScreenReport) -> ScreenResult {
    match report {
        ScreenReport::Completed(result) => result,
        ScreenReport::Failed(failure) => panic!("screen failed: {}", failure.error),
    }
}

#[tokio::test]
async fn test_growth_screen_scenario() {
    let config = TempConfig::new(POOL, RULES);
    let result = completed(screener(&config, scenario_provider()).run("semiconductors").await);

    assert_eq!(result.industry_matched, "semiconductors");
    assert_eq!(result.original_tickers, vec!["AAA", "BBB", "CCC"]);
    assert_eq!(result.snapshot_data.tickers(), vec!["AAA", "BBB", "CCC"]);
    // BBB misses the market cap floor, CCC has no P/E.
    assert_eq!(result.filtered_tickers, vec!["AAA"]);
    assert_eq!(result.screening_rules_applied.pe_max, Some(30.0));
    assert_eq!(result.screening_rules_applied.beta_max, None);
}

#[tokio::test]
async fn test_substring_keyword_resolves_same_pool() {
    let config = TempConfig::new(POOL, RULES);
    let pool = IndustryPool::load(&config.loader()).unwrap();
    let exact = pool.resolve("semiconductors").unwrap();
    let partial = pool.resolve("semi").unwrap();
    assert_eq!(exact, partial);

    let provider = scenario_provider();
    let calls = provider.clone();
    let result = completed(screener(&config, provider).run("semi").await);
    assert_eq!(result.industry_matched, "semiconductors");
    assert_eq!(result.filtered_tickers, vec!["AAA"]);
    assert_eq!(calls.calls(), vec!["AAA", "BBB", "CCC"]);
}

#[tokio::test]
async fn test_unknown_rule_set_is_error_bundle() {
    let config = TempConfig::new(POOL, RULES);
    let report = screener(&config, scenario_provider())
        .run_with_screen("semi", "momentum_screen")
        .await;

    match report {
        ScreenReport::Failed(failure) => {
            assert!(failure.error.contains("momentum_screen"));
            assert!(failure.industry_matched.is_none());
        }
        ScreenReport::Completed(_) => panic!("unknown rule set must not complete"),
    }
}

#[tokio::test]
async fn test_unknown_rule_set_performs_no_filtering() {
    let config = TempConfig::new(POOL, RULES);
    let loader = config.loader();
    let fetcher = SnapshotFetcher::new(Box::new(scenario_provider()), Duration::ZERO);
    let snapshot = fetcher.fetch(&["AAA".to_string()]).await.table;

    let err = ScreenApplicator::new(&loader)
        .apply(&snapshot, "momentum_screen")
        .unwrap_err();
    assert!(err.to_string().contains("momentum_screen"));
}

#[tokio::test]
async fn test_unknown_industry_lists_available() {
    let config = TempConfig::new(POOL, RULES);
    let provider = scenario_provider();
    let calls = provider.clone();
    let report = screener(&config, provider).run("utilities").await;

    let error = report.error().expect("expected failure");
    assert!(error.contains("utilities"));
    assert!(error.contains("semiconductors"));
    assert!(error.contains("cloud software"));
    assert!(calls.calls().is_empty(), "no fetch after failed resolution");
}

#[tokio::test]
async fn test_partial_failures_are_reported_not_fatal() {
    let config = TempConfig::new(POOL, RULES);
    let provider = scenario_provider().failing("BBB", Failure::RateLimited);
    let result = completed(screener(&config, provider).run("semi").await);

    assert_eq!(result.snapshot_data.tickers(), vec!["AAA", "CCC"]);
    assert_eq!(result.fetch_failures.len(), 1);
    assert_eq!(result.fetch_failures[0].ticker, "BBB");
    assert_eq!(result.fetch_failures[0].kind, FailureKind::RateLimited);
    assert_eq!(result.filtered_tickers, vec!["AAA"]);
}

#[tokio::test]
async fn test_all_failed_returns_error_marker() {
    let config = TempConfig::new(POOL, RULES);
    let provider = MockProvider::new().failing_all(Failure::NoData);
    let report = screener(&config, provider).run("semi").await;

    match report {
        ScreenReport::Failed(failure) => {
            assert_eq!(failure.error, "No data fetched for tickers.");
            assert_eq!(failure.industry_matched.as_deref(), Some("semiconductors"));
        }
        ScreenReport::Completed(_) => panic!("empty snapshot must not complete"),
    }
}

#[tokio::test]
async fn test_alternate_screen_uses_margin() {
    let config = TempConfig::new(POOL, RULES);
    let provider = MockProvider::new()
        .with_raw(
            "CRM",
            RawQuote {
                market_cap: Some(250e9),
                gross_margin: Some(0.76),
                ..RawQuote::default()
            },
        )
        .with_raw(
            "NOW",
            RawQuote {
                market_cap: Some(150e9),
                gross_margin: Some(0.45),
                ..RawQuote::default()
            },
        );

    let result = completed(
        screener(&config, provider)
            .run_with_screen("Cloud", "quality_screen")
            .await,
    );
    assert_eq!(result.industry_matched, "cloud software");
    assert_eq!(result.screen_name, "quality_screen");
    assert_eq!(result.filtered_tickers, vec!["CRM"]);
    assert_eq!(result.snapshot_data.get("CRM").unwrap().market_cap, Some(250.0));
}

#[tokio::test]
async fn test_report_json_shape() {
    let config = TempConfig::new(POOL, RULES);
    let report = screener(&config, scenario_provider()).run("semi").await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["industry_matched"], "semiconductors");
    assert_eq!(json["filtered_tickers"], serde_json::json!(["AAA"]));
    assert_eq!(json["screening_rules_applied"]["market_cap_min"], 10.0);
    assert_eq!(json["snapshot_data"].as_array().unwrap().len(), 3);
    assert!(json["snapshot_data"][2]["trailing_pe"].is_null());
    assert!(json.get("error").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_is_paced() {
    let config = TempConfig::new(POOL, RULES);
    let screener = Screener::new(
        config.loader(),
        SnapshotFetcher::new(Box::new(scenario_provider()), Duration::from_millis(200)),
    );

    let start = tokio::time::Instant::now();
    completed(screener.run("semi").await);
    assert!(start.elapsed() >= Duration::from_millis(400));
}
