//! 求人一覧ページのマークアップ契約
//!
//! サイト側のマークアップは予告なく変わるため、各フィールドは
//! 優先順のセレクタ列 (フォールバックチェーン) として保持する。
//! JSONファイルから上書きできる。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// 求人カード
    pub card: String,
    /// 検索結果0件の表示
    pub empty_results: String,
    /// カード上の求人URL属性
    pub job_link_attribute: String,
    pub job_category: Vec<String>,
    pub location: String,
    /// クリック後に表示されるプレビューパネル
    pub preview: String,
    /// プレビュー内の求人リンク（どのカードのプレビューかの判定用、空なら使わない）
    pub preview_link: String,
    pub job_title: Vec<String>,
    pub company_name: Vec<String>,
    /// 勤務形態の候補要素
    pub work_mode_candidates: String,
    pub work_mode_keywords: Vec<String>,
    /// 時計アイコン横の投稿日時テキスト
    pub date_posted: Vec<String>,
    pub skills: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            card: "div.job-card".to_string(),
            empty_results: "div.search-empty, div.no-result".to_string(),
            job_link_attribute: "data-search--job-selection-job-url-value".to_string(),
            job_category: vec![
                "div.imt-1 a.position-relative.stretched-link.text-rich-grey".to_string(),
                "a.position-relative.stretched-link.text-rich-grey".to_string(),
            ],
            location: "div.text-rich-grey.text-truncate.text-nowrap".to_string(),
            preview: "div.preview-job-wrapper".to_string(),
            preview_link: "div.preview-job-header a[href*='/it-jobs/']".to_string(),
            job_title: vec!["div.preview-job-header h2.text-it-black".to_string()],
            company_name: vec![
                "div.preview-job-header span a.normal-text".to_string(),
                "section.company-infos h2 a".to_string(),
            ],
            work_mode_candidates: "section.preview-job-overview span".to_string(),
            work_mode_keywords: vec![
                "office".to_string(),
                "remote".to_string(),
                "hybrid".to_string(),
            ],
            date_posted: vec![
                "section.preview-job-overview svg:has(use[href*='#clock']) + span".to_string(),
                "section.preview-job-overview svg:has(use[href*='clock']) ~ span".to_string(),
            ],
            skills: "section.preview-job-overview .d-flex.flex-wrap a.itag".to_string(),
        }
    }
}

impl Selectors {
    /// JSONファイルから読み込む（未指定のキーはデフォルト値）
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let selectors: Selectors = serde_json::from_str(&raw)
            .map_err(|e| ScraperError::Json(format!("{}: {}", path.display(), e)))?;
        selectors.validate()?;
        Ok(selectors)
    }

    /// 空のセレクタやチェーンを拒否
    pub fn validate(&self) -> Result<(), ScraperError> {
        let singles = [
            ("card", &self.card),
            ("job_link_attribute", &self.job_link_attribute),
            ("location", &self.location),
            ("preview", &self.preview),
            ("work_mode_candidates", &self.work_mode_candidates),
            ("skills", &self.skills),
        ];
        for (name, value) in singles {
            if value.trim().is_empty() {
                return Err(ScraperError::Config(format!("selector '{}' is empty", name)));
            }
        }

        let chains = [
            ("job_category", &self.job_category),
            ("job_title", &self.job_title),
            ("company_name", &self.company_name),
            ("date_posted", &self.date_posted),
        ];
        for (name, chain) in chains {
            if chain.is_empty() || chain.iter().any(|s| s.trim().is_empty()) {
                return Err(ScraperError::Config(format!(
                    "selector chain '{}' is empty or has a blank entry",
                    name
                )));
            }
        }
        Ok(())
    }

    /// ページ準備完了とみなすセレクタ（カード または 0件表示）
    pub fn readiness(&self) -> Vec<String> {
        let mut ready = vec![self.card.clone()];
        if !self.empty_results.trim().is_empty() {
            ready.push(self.empty_results.clone());
        }
        ready
    }
}
