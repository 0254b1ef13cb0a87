//! 求人一覧のページ巡回
//!
//! ページ 1 から順に `{base_url}?page=N` を開き、カードを RecordExtractor に渡す。
//!
//! - カード一覧が出ないページ: 追加待機の後に読み飛ばして次へ
//! - 読み込めたがカード0件: 最終ページとみなして終了
//! - ブラウザ自体のエラー: 即座に中断

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::links::{page_url, site_origin};
use crate::listing::extractor::{CardPosition, RecordExtractor};
use crate::listing::types::{CrawlStats, JobRecord, StopReason, WalkSummary};
use crate::traits::Driver;

/// 1ページ分の結果
enum PageOutcome {
    /// 一覧が出なかった
    Skipped,
    /// 0件
    Exhausted,
    Extracted,
}

pub struct PageWalker<'a, D: Driver> {
    driver: &'a D,
    config: &'a ScraperConfig,
    listing_url: Url,
    clock: fn() -> NaiveDateTime,
}

impl<'a, D: Driver> PageWalker<'a, D> {
    pub fn new(driver: &'a D, config: &'a ScraperConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            driver,
            config,
            listing_url: config.listing_url()?,
            clock: local_now,
        })
    }

    /// 投稿日時の基準時刻を差し替える
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// 巡回してレコードを返す（ページ順 → カード順）
    pub async fn run(&self, max_pages: Option<u32>) -> Result<Vec<JobRecord>, ScraperError> {
        Ok(self.walk(max_pages).await?.records)
    }

    /// 巡回して統計付きで返す
    pub async fn walk(&self, max_pages: Option<u32>) -> Result<WalkSummary, ScraperError> {
        let origin = site_origin(&self.listing_url);
        let extractor = RecordExtractor::new(&self.config.selectors, origin)
            .with_preview_wait(self.config.preview_timeout, self.config.poll_interval);

        if max_pages.is_none() && self.config.max_consecutive_skips.is_none() {
            warn!(
                "Unbounded walk without max_consecutive_skips: only a page matching '{}' ends it",
                self.config.selectors.empty_results
            );
        }

        let mut summary = WalkSummary::default();
        let mut consecutive_skips = 0u32;
        let mut page = 1u32;

        loop {
            if let Some(limit) = max_pages {
                if page > limit {
                    summary.stats.stop_reason = StopReason::PageLimit;
                    break;
                }
            }

            match self.walk_page(page, &extractor, &mut summary).await? {
                PageOutcome::Exhausted => {
                    info!("No jobs on page {}, stopping", page);
                    summary.stats.stop_reason = StopReason::EndOfResults;
                    break;
                }
                PageOutcome::Skipped => {
                    summary.stats.pages_skipped.push(page);
                    consecutive_skips += 1;
                    if let Some(limit) = self.config.max_consecutive_skips {
                        if consecutive_skips >= limit {
                            warn!(
                                "{} consecutive pages failed to load, stopping at page {}",
                                consecutive_skips, page
                            );
                            summary.stats.stop_reason = StopReason::ConsecutiveSkips;
                            break;
                        }
                    }
                }
                PageOutcome::Extracted => consecutive_skips = 0,
            }

            page += 1;
        }

        summary.stats.records = summary.records.len();
        log_stats(&summary.stats);
        Ok(summary)
    }

    async fn walk_page(
        &self,
        page: u32,
        extractor: &RecordExtractor<'_>,
        summary: &mut WalkSummary,
    ) -> Result<PageOutcome, ScraperError> {
        let url = page_url(&self.listing_url, page);
        info!("Crawling page {}: {}", page, url);

        self.driver.navigate(&url).await?;
        summary.stats.pages_visited += 1;

        if !self.wait_for_listing(page).await? {
            warn!("Page {} did not render job cards, skipping", page);
            self.dump_screenshot(page).await;
            return Ok(PageOutcome::Skipped);
        }

        let cards = self.driver.find_all(&self.config.selectors.card).await?;
        if cards.is_empty() {
            return Ok(PageOutcome::Exhausted);
        }

        let total = cards.len();
        for (i, card) in cards.iter().enumerate() {
            let pos = CardPosition { page, card: i + 1 };
            summary.stats.cards_seen += 1;

            match extractor.extract(self.driver, card, pos, (self.clock)()).await {
                Ok(record) => {
                    info!("Page {} - job {}/{}: {}", page, pos.card, total, record.job_title);
                    summary.records.push(record);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Page {} - job {}/{} skipped: {}", page, pos.card, total, e);
                    summary.stats.cards_failed += 1;
                }
            }
        }

        Ok(PageOutcome::Extracted)
    }

    /// カード（または0件表示）の出現を待つ。最初の待機の後、短い追加待機を数回行う
    async fn wait_for_listing(&self, page: u32) -> Result<bool, ScraperError> {
        let readiness = self.config.selectors.readiness();
        let mut timeout = self.config.page_timeout;

        for attempt in 0..=self.config.page_ready_retries {
            if attempt > 0 {
                debug!(
                    "Page {} listing not ready, extra wait {}/{}",
                    page, attempt, self.config.page_ready_retries
                );
                timeout = self.config.page_retry_wait;
            }
            if self
                .driver
                .wait_until_present(&readiness, timeout, self.config.poll_interval)
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn dump_screenshot(&self, page: u32) {
        if !self.config.debug {
            return;
        }
        match self.driver.screenshot_base64().await {
            Ok(Some(encoded)) => {
                debug!("Page {} screenshot: data:image/png;base64,{}", page, encoded)
            }
            Ok(None) => {}
            Err(e) => debug!("Page {} screenshot failed: {}", page, e),
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn log_stats(stats: &CrawlStats) {
    info!(
        "Crawl finished: {} pages visited, {} skipped {:?}, {}/{} cards extracted, stop={:?}",
        stats.pages_visited,
        stats.pages_skipped.len(),
        stats.pages_skipped,
        stats.records,
        stats.cards_seen,
        stats.stop_reason
    );
}
