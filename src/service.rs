use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Local;
use tower::Service;
use tracing::{info, warn};

use crate::chrome::ChromeDriver;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::listing::{CrawlStats, PageWalker};
use crate::output::CsvSink;
use crate::relative_time::format_timestamp;
use crate::traits::Driver;

/// クロールリクエスト（実行パラメータの上書き）
#[derive(Debug, Clone, Default)]
pub struct CrawlRequest {
    /// Some(None) = 無制限
    pub max_pages: Option<Option<u32>>,
    pub headless: Option<bool>,
    pub output_path: Option<PathBuf>,
}

impl CrawlRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// ベース設定に上書きを適用
    pub fn apply(self, mut config: ScraperConfig) -> ScraperConfig {
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(headless) = self.headless {
            config.headless = headless;
        }
        if let Some(path) = self.output_path {
            config.output_path = path;
        }
        config
    }
}

/// クロール結果
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub output_path: PathBuf,
    pub record_count: usize,
    pub crawl_date: String,
    pub stats: CrawlStats,
}

/// tower::Serviceを実装したクローラーサービス
#[derive(Debug, Clone, Default)]
pub struct CrawlService {
    config: ScraperConfig,
}

impl CrawlService {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

impl Service<CrawlRequest> for CrawlService {
    type Response = CrawlResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        let config = req.apply(self.config.clone());
        info!(
            "Crawl request received: base_url={}, max_pages={:?}, headless={}",
            config.base_url, config.max_pages, config.headless
        );

        Box::pin(async move {
            config.validate()?;
            let mut driver = ChromeDriver::launch(&config).await?;
            execute(&mut driver, &config).await
        })
    }
}

/// 巡回 → ブラウザ終了 → CSV出力
///
/// ブラウザは結果に関わらず必ず閉じる。
pub async fn execute<D: Driver>(
    driver: &mut D,
    config: &ScraperConfig,
) -> Result<CrawlResult, ScraperError> {
    let walked = match PageWalker::new(&*driver, config) {
        Ok(walker) => walker.walk(config.max_pages).await,
        Err(e) => Err(e),
    };

    if let Err(e) = driver.close().await {
        warn!("Failed to close browser: {}", e);
    }
    let summary = walked?;

    let crawl_date = format_timestamp(Local::now().naive_local());
    let sink = CsvSink::new(&config.output_path, crawl_date.clone());
    let output_path = sink.write_table(&summary.records)?;

    info!(
        "Crawl completed: {} records -> {:?}",
        summary.records.len(),
        output_path
    );

    Ok(CrawlResult {
        output_path,
        record_count: summary.records.len(),
        crawl_date,
        stats: summary.stats,
    })
}
