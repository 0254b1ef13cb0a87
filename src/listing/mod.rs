//! 求人一覧スクレイパーモジュール
//!
//! ページ巡回 (PageWalker) とカード単位の抽出 (RecordExtractor)

mod extractor;
mod selectors;
mod types;
mod walker;

#[cfg(test)]
pub(crate) mod fake;

pub use extractor::{CardPosition, RecordExtractor};
pub use selectors::Selectors;
pub use types::{CrawlStats, JobRecord, StopReason, WalkSummary, OUTPUT_COLUMNS};
pub use walker::PageWalker;
