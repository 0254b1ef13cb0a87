//! 求人一覧スクレイパー CLI
//!
//! 実行方法:
//! ```text
//! cargo run -- --max-pages 3 --headless true
//! RUST_LOG=debug cargo run -- --all-pages --output ./data/jobs.csv
//! ```

use std::path::PathBuf;

use clap::Parser;
use jobboard_scraper::{CrawlRequest, CrawlService, ScraperConfig, Selectors};
use tower::Service;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jobboard-scraper", version, about = "Crawl paginated job listings into a CSV file")]
struct Cli {
    /// Listing URL; pages are requested as `{base_url}?page=N`
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Number of pages to crawl
    #[arg(long, value_name = "N", conflicts_with = "all_pages")]
    max_pages: Option<u32>,

    /// Crawl until a page renders with no jobs.
    ///
    /// A page that never renders is skipped, not treated as the end. If the
    /// site's empty-results marker does not match the `empty_results` selector,
    /// the last page is skipped too and the crawl never ends on its own.
    /// Combine with `--max-consecutive-skips` to bound such runs.
    #[arg(long)]
    all_pages: bool,

    /// Hide the browser window (defaults to true on GitHub Actions, false elsewhere)
    #[arg(long, value_name = "BOOL")]
    headless: Option<bool>,

    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// JSON file overriding the page selectors
    #[arg(long, value_name = "FILE")]
    selectors: Option<PathBuf>,

    /// Stop after this many pages in a row fail to load (recommended with --all-pages)
    #[arg(long, value_name = "N")]
    max_consecutive_skips: Option<u32>,

    /// Log screenshots of pages that fail to load
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn into_parts(self) -> Result<(ScraperConfig, CrawlRequest), Box<dyn std::error::Error>> {
        let mut config = ScraperConfig::from_env()
            .with_debug(self.debug)
            .with_max_consecutive_skips(self.max_consecutive_skips);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(chrome) = self.chrome {
            config = config.with_chrome_executable(chrome);
        }
        if let Some(path) = self.selectors {
            config = config.with_selectors(Selectors::from_json_file(path)?);
        }

        let mut request = CrawlRequest::new();
        if self.all_pages {
            request = request.with_max_pages(None);
        } else if let Some(n) = self.max_pages {
            request = request.with_max_pages(Some(n));
        }
        if let Some(headless) = self.headless {
            request = request.with_headless(headless);
        }
        if let Some(output) = self.output {
            request = request.with_output_path(output);
        }

        Ok((config, request))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, request) = Cli::parse().into_parts()?;

    println!("=== Job Board Scraper ===");
    println!("Base URL: {}", config.base_url);

    let mut service = CrawlService::new(config);
    let result = service.call(request).await?;

    println!("Crawled {} jobs.", result.record_count);
    println!("CSV saved to: {}", result.output_path.display());
    Ok(())
}
