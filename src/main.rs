use anyhow::Result;
use clap::Parser;
use coupang_scraper::{AppConfig, ProductScraper, ScrapeOutcome};
use tracing::info;

/// Scrape product pages (deep links or direct URLs) and print one JSON
/// report per URL.
#[derive(Parser, Debug)]
#[command(name = "coupang-scraper", version, about)]
struct Cli {
    /// Deep links or canonical product URLs
    #[arg(required = true)]
    urls: Vec<String>,

    /// Pretty-print the JSON reports
    #[arg(long)]
    pretty: bool,

    /// Disable both rendered fallback tiers for this run
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coupang_scraper=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().unwrap_or_else(|e| {
        info!("falling back to built-in defaults: {e}");
        AppConfig::default()
    });
    if cli.no_fallback {
        config.browser.enabled = false;
        config.render_api.enabled = false;
    }

    let scraper = ProductScraper::new(&config)?;

    // Concurrency lives at the call site; each scrape is independent
    let reports =
        futures::future::join_all(cli.urls.iter().map(|url| scraper.scrape(url))).await;

    let mut any_failed = false;
    for report in &reports {
        if !report.outcome.is_success() {
            any_failed = true;
        }
        let line = if cli.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        println!("{line}");
    }

    if any_failed {
        let failures = reports
            .iter()
            .filter(|r| matches!(r.outcome, ScrapeOutcome::Error { .. }))
            .count();
        info!("{failures}/{} scrapes failed", reports.len());
        std::process::exit(1);
    }

    Ok(())
}
