//! 求人一覧スクレイパーライブラリ
//!
//! - JavaScriptで描画される求人一覧をページ単位で巡回
//! - 各カードのプレビューを開いてフィールドを抽出
//! - BOM付きUTF-8のCSVへ保存
//!
//! # 使用例
//!
//! ```rust,ignore
//! use jobboard_scraper::{CrawlRequest, CrawlService, ScraperConfig};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = CrawlService::new(ScraperConfig::from_env());
//!
//!     let request = CrawlRequest::new()
//!         .with_max_pages(Some(3))
//!         .with_output_path("./jobs.csv");
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("{} jobs -> {:?}", result.record_count, result.output_path);
//! }
//! ```
//!
//! # 任意の Driver で巡回
//!
//! ```rust,ignore
//! use jobboard_scraper::{ChromeDriver, Driver, PageWalker, ScraperConfig};
//!
//! let config = ScraperConfig::default().with_max_pages(None);
//! let mut driver = ChromeDriver::launch(&config).await?;
//! let records = PageWalker::new(&driver, &config)?.run(config.max_pages).await;
//! driver.close().await?;
//! ```

pub mod chrome;
pub mod config;
pub mod error;
pub mod links;
pub mod listing;
pub mod output;
pub mod relative_time;
pub mod service;
pub mod traits;

// 主要な型をリエクスポート
pub use chrome::ChromeDriver;
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use listing::{CrawlStats, JobRecord, PageWalker, RecordExtractor, Selectors, StopReason};
pub use output::CsvSink;
pub use service::{CrawlRequest, CrawlResult, CrawlService};
pub use traits::Driver;
