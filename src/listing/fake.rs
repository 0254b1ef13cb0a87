//! テスト用のインメモリ Driver
//!
//! 求人一覧ページ・カード・プレビューをメモリ上で再現する。
//! プレビューパネルは1つだけで、クリック後も前のカードの内容を表示し続け、
//! `FakePreview::delay` が経過した時点でクリックされたカードの内容に切り替わる。
//! プレビューの無いカードをクリックしても切り替わらない。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::ScraperError;
use crate::listing::Selectors;
use crate::traits::Driver;

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePreview {
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_fallback: Option<String>,
    pub overview_spans: Vec<String>,
    pub clock_text: Option<String>,
    pub clock_text_fallback: Option<String>,
    pub skills: Vec<String>,
    /// クリックから表示が切り替わるまでの時間
    pub delay: Duration,
    /// タイトル要素の読み取りが失敗する
    pub broken_title: bool,
    /// 投稿日時の読み取りでセッション切断
    pub disconnect_on_date: bool,
    /// スキル一覧の取得でセッション切断
    pub disconnect_on_skills: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeCard {
    pub link: Option<String>,
    pub category: Option<String>,
    pub category_fallback: Option<String>,
    pub locations: Vec<String>,
    /// None = クリックしてもプレビューが出ない
    pub preview: Option<FakePreview>,
    pub click_error: bool,
}

impl FakeCard {
    /// プレビュー付きの標準的なカード
    pub fn job(title: &str, company: &str) -> Self {
        Self {
            link: Some(format!("/it-jobs/{}", title.to_lowercase().replace(' ', "-"))),
            category: Some("Software Engineer".into()),
            locations: vec!["Ho Chi Minh".into()],
            preview: Some(FakePreview {
                title: Some(title.into()),
                company: Some(company.into()),
                overview_spans: vec!["At office".into()],
                clock_text: Some("2 hours ago".into()),
                skills: vec!["Rust".into(), "SQL".into()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn without_preview(mut self) -> Self {
        self.preview = None;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum FakePage {
    Cards(Vec<FakeCard>),
    /// 0件表示のみ
    Empty,
    /// 何も描画されない
    NeverLoads,
    /// 遷移後、指定時間が経ってからカードが出る
    Delayed(Duration, Vec<FakeCard>),
    /// 一覧取得でセッション切断
    Crash,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FakeElement {
    Card(usize),
    /// 表示中の内容はクリック履歴で決まる
    Preview,
    EmptyMarker,
    Link(String),
    Node { text: String, fault: Option<Fault> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Fault {
    Stale,
    Disconnected,
}

impl FakeElement {
    fn node(text: &str) -> Self {
        FakeElement::Node {
            text: text.to_string(),
            fault: None,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    current_page: Option<u32>,
    navigated_at: Option<Instant>,
    /// プレビューに表示中のカード
    open_preview: Option<usize>,
    /// 最後にクリックされたカードとその時刻
    pending_preview: Option<(usize, Instant)>,
    navigations: Vec<String>,
    clicks: Vec<(u32, usize)>,
    closed: bool,
}

pub(crate) struct FakeDriver {
    selectors: Selectors,
    pages: HashMap<u32, FakePage>,
    fail_navigation_on: Option<u32>,
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new(selectors: Selectors) -> Self {
        Self {
            selectors,
            pages: HashMap::new(),
            fail_navigation_on: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_page(mut self, page: u32, content: FakePage) -> Self {
        self.pages.insert(page, content);
        self
    }

    pub fn failing_navigation_on(mut self, page: u32) -> Self {
        self.fail_navigation_on = Some(page);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<(u32, usize)> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// 単一ページをロード済みにした状態（RecordExtractor 単体テスト用）
    pub fn loaded(selectors: Selectors, cards: Vec<FakeCard>) -> Self {
        let driver = Self::new(selectors).with_page(1, FakePage::Cards(cards));
        {
            let mut state = driver.state.lock().unwrap();
            state.current_page = Some(1);
            state.navigated_at = Some(Instant::now());
        }
        driver
    }

    fn page_number(url: &str) -> u32 {
        url.rsplit("page=")
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(1)
    }

    /// 現在のページ内容（未登録のページ番号は0件ページ扱い）
    fn current(&self) -> Option<(Option<&FakePage>, Option<Instant>)> {
        let state = self.state.lock().unwrap();
        let page = state.current_page?;
        Some((self.pages.get(&page), state.navigated_at))
    }

    /// 現時点で描画されているカード
    fn visible_cards(&self) -> Result<Vec<FakeCard>, ScraperError> {
        let Some((Some(content), navigated_at)) = self.current() else {
            return Ok(Vec::new());
        };
        match content {
            FakePage::Cards(cards) => Ok(cards.clone()),
            FakePage::Delayed(delay, cards) => {
                let elapsed = navigated_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= *delay {
                    Ok(cards.clone())
                } else {
                    Ok(Vec::new())
                }
            }
            FakePage::Crash => Err(ScraperError::Driver("browser disconnected".into())),
            FakePage::Empty | FakePage::NeverLoads => Ok(Vec::new()),
        }
    }

    fn card(&self, index: usize) -> Result<FakeCard, ScraperError> {
        self.visible_cards()?
            .get(index)
            .cloned()
            .ok_or_else(|| ScraperError::ElementNotFound(format!("stale card {}", index)))
    }

    /// プレビューに表示中のカード（切り替え待ちがあれば時刻を見て反映）
    fn displayed_preview(&self) -> Result<Option<usize>, ScraperError> {
        let (open, pending) = {
            let state = self.state.lock().unwrap();
            (state.open_preview, state.pending_preview)
        };
        let Some((clicked, at)) = pending else {
            return Ok(open);
        };
        let ready = match self.card(clicked)?.preview {
            Some(preview) => at.elapsed() >= preview.delay,
            None => false,
        };
        if !ready {
            return Ok(open);
        }

        let mut state = self.state.lock().unwrap();
        state.open_preview = Some(clicked);
        state.pending_preview = None;
        Ok(Some(clicked))
    }

    fn texts(values: &[String]) -> Vec<FakeElement> {
        values.iter().map(|v| FakeElement::node(v)).collect()
    }

    fn optional(value: &Option<String>) -> Vec<FakeElement> {
        value.iter().map(|v| FakeElement::node(v)).collect()
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        let page = Self::page_number(url);
        if self.fail_navigation_on == Some(page) {
            return Err(ScraperError::Navigation(format!("net::ERR_CONNECTION_RESET {}", url)));
        }
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.current_page = Some(page);
        state.navigated_at = Some(Instant::now());
        state.open_preview = None;
        state.pending_preview = None;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, ScraperError> {
        let s = &self.selectors;
        if selector == s.card {
            let cards = self.visible_cards()?;
            return Ok((0..cards.len()).map(FakeElement::Card).collect());
        }
        if selector == s.empty_results {
            let empty = matches!(
                self.current(),
                Some((None | Some(FakePage::Empty), _))
            );
            return Ok(if empty { vec![FakeElement::EmptyMarker] } else { Vec::new() });
        }
        if selector == s.preview {
            let open = self.displayed_preview()?;
            return Ok(open.map(|_| FakeElement::Preview).into_iter().collect());
        }
        Ok(Vec::new())
    }

    async fn find_within(
        &self,
        scope: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, ScraperError> {
        let s = &self.selectors;
        match scope {
            FakeElement::Card(i) => {
                let card = self.card(*i)?;
                if selector == s.job_category[0] {
                    Ok(Self::optional(&card.category))
                } else if s.job_category.get(1).map(String::as_str) == Some(selector) {
                    Ok(Self::optional(&card.category_fallback))
                } else if selector == s.location {
                    Ok(Self::texts(&card.locations))
                } else {
                    Ok(Vec::new())
                }
            }
            FakeElement::Preview => {
                let Some(shown) = self.displayed_preview()? else {
                    return Ok(Vec::new());
                };
                let card = self.card(shown)?;
                let Some(preview) = card.preview else {
                    return Ok(Vec::new());
                };
                if selector == s.preview_link {
                    Ok(card.link.into_iter().map(FakeElement::Link).collect())
                } else if selector == s.job_title[0] {
                    Ok(preview
                        .title
                        .iter()
                        .map(|t| FakeElement::Node {
                            text: t.clone(),
                            fault: preview.broken_title.then_some(Fault::Stale),
                        })
                        .collect())
                } else if selector == s.company_name[0] {
                    Ok(Self::optional(&preview.company))
                } else if s.company_name.get(1).map(String::as_str) == Some(selector) {
                    Ok(Self::optional(&preview.company_fallback))
                } else if selector == s.work_mode_candidates {
                    Ok(Self::texts(&preview.overview_spans))
                } else if selector == s.date_posted[0] {
                    Ok(preview
                        .clock_text
                        .iter()
                        .map(|t| FakeElement::Node {
                            text: t.clone(),
                            fault: preview.disconnect_on_date.then_some(Fault::Disconnected),
                        })
                        .collect())
                } else if s.date_posted.get(1).map(String::as_str) == Some(selector) {
                    Ok(Self::optional(&preview.clock_text_fallback))
                } else if selector == s.skills {
                    if preview.disconnect_on_skills {
                        return Err(ScraperError::Driver("browser disconnected".into()));
                    }
                    Ok(Self::texts(&preview.skills))
                } else {
                    Ok(Vec::new())
                }
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn read_text(&self, element: &FakeElement) -> Result<String, ScraperError> {
        match element {
            FakeElement::Node {
                fault: Some(Fault::Stale),
                ..
            } => Err(ScraperError::ElementNotFound("stale element reference".into())),
            FakeElement::Node {
                fault: Some(Fault::Disconnected),
                ..
            } => Err(ScraperError::Driver("browser disconnected".into())),
            FakeElement::Node { text, .. } => Ok(text.trim().to_string()),
            _ => Ok(String::new()),
        }
    }

    async fn read_attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        match element {
            FakeElement::Card(i) if name == self.selectors.job_link_attribute => {
                Ok(self.card(*i)?.link)
            }
            FakeElement::Link(href) if name == "href" => Ok(Some(href.clone())),
            _ => Ok(None),
        }
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn click(&self, element: &FakeElement) -> Result<(), ScraperError> {
        let FakeElement::Card(i) = element else {
            return Ok(());
        };
        let card = self.card(*i)?;
        if card.click_error {
            return Err(ScraperError::JavaScript("element is not clickable".into()));
        }
        let mut state = self.state.lock().unwrap();
        let page = state.current_page.unwrap_or_default();
        state.clicks.push((page, *i));
        state.pending_preview = Some((*i, Instant::now()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
