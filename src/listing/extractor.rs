//! カード1件から JobRecord を組み立てる
//!
//! 1. カード上のフィールド（リンク・カテゴリ・勤務地）を読む
//! 2. カードをクリックしてプレビューを開き、残りのフィールドを読む
//!
//! フィールド単位の失敗は空文字に落として続行する。
//! プレビューが開かない場合のみカード全体を失敗とする。
//!
//! プレビューパネルはクリック後も前のカードの内容のまま残るため、
//! 「パネルがある」ではなく「パネルの中身がこのカードに切り替わった」まで待つ。

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::ScraperError;
use crate::listing::{JobRecord, Selectors};
use crate::links::absolutize;
use crate::relative_time;
use crate::traits::{wait_until, Driver};

/// ログ用のカード位置（card は1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPosition {
    pub page: u32,
    pub card: usize,
}

/// プレビューに表示中の求人
#[derive(Debug, Clone, PartialEq, Eq)]
struct PreviewIdentity {
    link: String,
    title: String,
    company: String,
}

impl PreviewIdentity {
    fn shows(&self, job_link: &str) -> bool {
        !job_link.is_empty() && self.link == job_link
    }
}

pub struct RecordExtractor<'a> {
    selectors: &'a Selectors,
    origin: String,
    preview_timeout: Duration,
    poll_interval: Duration,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(selectors: &'a Selectors, origin: impl Into<String>) -> Self {
        Self {
            selectors,
            origin: origin.into(),
            preview_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn with_preview_wait(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.preview_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// カード1件を抽出
    ///
    /// `Err` はプレビューが開けなかった（またはブラウザが落ちた）場合のみ。
    pub async fn extract<D: Driver>(
        &self,
        driver: &D,
        card: &D::Element,
        pos: CardPosition,
        now: NaiveDateTime,
    ) -> Result<JobRecord, ScraperError> {
        let s = self.selectors;

        // カード上のフィールド
        let job_link = self.contain(pos, "job_link", self.job_link(driver, card).await)?;
        let job_category = self.contain(
            pos,
            "job_category",
            first_text(driver, card, &s.job_category).await,
        )?;
        let location = self.contain(
            pos,
            "location",
            joined_texts(driver, card, &s.location, "; ", true).await,
        )?;

        // プレビューを開く
        let preview = self.open_preview(driver, card, &job_link).await?;

        let job_title = self.contain(
            pos,
            "job_title",
            first_text(driver, &preview, &s.job_title).await,
        )?;
        let company_name = self.contain(
            pos,
            "company_name",
            first_text(driver, &preview, &s.company_name).await,
        )?;
        let work_mode = self.contain(pos, "work_mode", self.work_mode(driver, &preview).await)?;
        let raw_posted = self.contain(
            pos,
            "date_posted",
            first_text(driver, &preview, &s.date_posted).await,
        )?;
        let skills_required = self.contain(
            pos,
            "skills_required",
            joined_texts(driver, &preview, &s.skills, ", ", false).await,
        )?;

        Ok(JobRecord {
            job_title,
            company_name,
            location,
            skills_required,
            date_posted: relative_time::normalize_to_string(&raw_posted, now),
            job_link,
            job_category,
            work_mode,
        })
    }

    async fn job_link<D: Driver>(
        &self,
        driver: &D,
        card: &D::Element,
    ) -> Result<String, ScraperError> {
        let raw = driver
            .read_attribute(card, &self.selectors.job_link_attribute)
            .await?
            .unwrap_or_default();
        Ok(absolutize(&raw, &self.origin))
    }

    /// スクロール → クリック → プレビューがこのカードに切り替わるまで待つ
    ///
    /// クリック前に表示中だったプレビューを記録し、リンクがこのカードと一致するか
    /// 表示内容が変わった時点で開いたとみなす。
    async fn open_preview<D: Driver>(
        &self,
        driver: &D,
        card: &D::Element,
        job_link: &str,
    ) -> Result<D::Element, ScraperError> {
        let previous = match self.displayed_preview(driver).await {
            Ok(previous) => previous,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("Could not read current preview before click: {}", e);
                None
            }
        };

        driver.scroll_into_view(card).await?;
        driver.click(card).await?;

        let previous = previous.as_ref();
        let switched = wait_until(self.preview_timeout, self.poll_interval, move || async move {
            Ok::<_, ScraperError>(match self.displayed_preview(driver).await? {
                Some(current) => current.shows(job_link) || previous != Some(&current),
                None => false,
            })
        })
        .await?;
        if !switched {
            return Err(ScraperError::Timeout(match previous {
                Some(stale) => format!(
                    "preview still shows '{}' after {:?}",
                    stale.title, self.preview_timeout
                ),
                None => format!(
                    "preview '{}' did not appear within {:?}",
                    self.selectors.preview, self.preview_timeout
                ),
            }));
        }

        driver
            .find_all(&self.selectors.preview)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ScraperError::ElementNotFound(self.selectors.preview.clone()))
    }

    /// 表示中のプレビューの識別情報（パネルが無ければ None）
    async fn displayed_preview<D: Driver>(
        &self,
        driver: &D,
    ) -> Result<Option<PreviewIdentity>, ScraperError> {
        let s = self.selectors;
        let Some(preview) = driver.find_all(&s.preview).await?.into_iter().next() else {
            return Ok(None);
        };

        let link = if s.preview_link.trim().is_empty() {
            String::new()
        } else {
            match driver.find_within(&preview, &s.preview_link).await?.first() {
                Some(anchor) => {
                    let href = lenient(driver.read_attribute(anchor, "href").await)?;
                    absolutize(&href.unwrap_or_default(), &self.origin)
                }
                None => String::new(),
            }
        };

        Ok(Some(PreviewIdentity {
            link,
            title: lenient(first_text(driver, &preview, &s.job_title).await)?,
            company: lenient(first_text(driver, &preview, &s.company_name).await)?,
        }))
    }

    /// キーワード (office / remote / hybrid) を含む最初の要素
    async fn work_mode<D: Driver>(
        &self,
        driver: &D,
        preview: &D::Element,
    ) -> Result<String, ScraperError> {
        let keywords: Vec<String> = self
            .selectors
            .work_mode_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        let candidates = driver
            .find_within(preview, &self.selectors.work_mode_candidates)
            .await?;
        for candidate in &candidates {
            let text = match driver.read_text(candidate).await {
                Ok(text) => text,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!("Skipping unreadable work mode candidate: {}", e);
                    continue;
                }
            };
            let lowered = text.to_lowercase();
            if !text.is_empty() && keywords.iter().any(|k| lowered.contains(k.as_str())) {
                return Ok(text);
            }
        }
        Ok(String::new())
    }

    /// フィールド単位の失敗を空文字に落とす（致命的エラーはそのまま返す）
    fn contain(
        &self,
        pos: CardPosition,
        field: &str,
        result: Result<String, ScraperError>,
    ) -> Result<String, ScraperError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    "Page {} card {}: {} unreadable, leaving empty: {}",
                    pos.page, pos.card, field, e
                );
                Ok(String::new())
            }
        }
    }
}

/// 回復可能なエラーを既定値に落とす
fn lenient<T: Default>(result: Result<T, ScraperError>) -> Result<T, ScraperError> {
    match result {
        Err(e) if !e.is_fatal() => Ok(T::default()),
        other => other,
    }
}

/// フォールバックチェーンを先頭から試し、最初の空でないテキストを返す
///
/// 後続のセレクタは前のセレクタが空またはエラーの場合のみ試す。
/// 全て空なら空文字、エラーがあれば最後のエラー。
async fn first_text<D: Driver>(
    driver: &D,
    scope: &D::Element,
    chain: &[String],
) -> Result<String, ScraperError> {
    let mut last_error = None;

    for (rank, selector) in chain.iter().enumerate() {
        let attempt = match driver.find_within(scope, selector).await {
            Ok(found) => match found.first() {
                Some(element) => driver.read_text(element).await,
                None => Ok(String::new()),
            },
            Err(e) => Err(e),
        };

        match attempt {
            Ok(text) if !text.is_empty() => {
                if rank > 0 {
                    debug!("Fallback selector #{} '{}' matched", rank, selector);
                }
                return Ok(text);
            }
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(String::new()),
    }
}

/// 一致した全要素のテキストを区切り文字で連結（DOM順・重複あり）
async fn joined_texts<D: Driver>(
    driver: &D,
    scope: &D::Element,
    selector: &str,
    separator: &str,
    skip_blank: bool,
) -> Result<String, ScraperError> {
    let elements = driver.find_within(scope, selector).await?;
    let mut texts = Vec::with_capacity(elements.len());
    for element in &elements {
        let text = driver.read_text(element).await?;
        if skip_blank && text.is_empty() {
            continue;
        }
        texts.push(text);
    }
    Ok(texts.join(separator))
}
