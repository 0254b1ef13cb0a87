use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ScraperError;
use crate::listing::Selectors;

pub const DEFAULT_BASE_URL: &str = "https://itviec.com/it-jobs";
pub const DEFAULT_MAX_PAGES: u32 = 56;
pub const DEFAULT_OUTPUT: &str = "itviec_jobs_full.csv";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    /// None = 0件ページが出るまで巡回
    pub max_pages: Option<u32>,
    pub headless: bool,
    /// カード一覧の出現待ち
    pub page_timeout: Duration,
    /// 一覧が出ない場合の追加待機
    pub page_retry_wait: Duration,
    pub page_ready_retries: u32,
    /// 連続して読み飛ばしたページ数の上限（None = 無制限）
    pub max_consecutive_skips: Option<u32>,
    /// プレビューパネルの出現待ち
    pub preview_timeout: Duration,
    pub poll_interval: Duration,
    pub output_path: PathBuf,
    pub chrome_executable: Option<PathBuf>,
    pub debug: bool,
    pub selectors: Selectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_pages: Some(DEFAULT_MAX_PAGES),
            headless: true,
            page_timeout: Duration::from_secs(15),
            page_retry_wait: Duration::from_secs(3),
            page_ready_retries: 2,
            max_consecutive_skips: None,
            preview_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            chrome_executable: None,
            debug: false,
            selectors: Selectors::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 環境変数から実行環境に合わせた設定を作る
    ///
    /// - `GITHUB_ACTIONS=true` ならヘッドレス、ローカルではブラウザを表示
    /// - `CHROME_PATH` / `CHROMIUM_PATH` があれば実行ファイルとして使う
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::for_environment(
            var("GITHUB_ACTIONS").as_deref(),
            var("CHROME_PATH").as_deref(),
            var("CHROMIUM_PATH").as_deref(),
        )
    }

    /// 環境変数の値から設定を作る（`CHROME_PATH` が `CHROMIUM_PATH` より優先）
    pub fn for_environment(
        github_actions: Option<&str>,
        chrome_path: Option<&str>,
        chromium_path: Option<&str>,
    ) -> Self {
        let chrome_executable = non_blank(chrome_path)
            .or(non_blank(chromium_path))
            .map(PathBuf::from);

        Self {
            headless: github_actions == Some("true"),
            chrome_executable,
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_page_retries(mut self, retries: u32, wait: Duration) -> Self {
        self.page_ready_retries = retries;
        self.page_retry_wait = wait;
        self
    }

    pub fn with_max_consecutive_skips(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_skips = limit;
        self
    }

    pub fn with_preview_timeout(mut self, timeout: Duration) -> Self {
        self.preview_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// 一覧URLをパース
    pub fn listing_url(&self) -> Result<Url, ScraperError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ScraperError::Config(format!("base_url '{}': {}", self.base_url, e)))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ScraperError::Config(format!(
                "base_url '{}' has no host",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// ブラウザ起動前の検証
    pub fn validate(&self) -> Result<(), ScraperError> {
        self.listing_url()?;
        if self.max_pages == Some(0) {
            return Err(ScraperError::Config("max_pages must be at least 1".into()));
        }
        if self.max_consecutive_skips == Some(0) {
            return Err(ScraperError::Config(
                "max_consecutive_skips must be at least 1".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ScraperError::Config("poll_interval must be non-zero".into()));
        }
        self.selectors.validate()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
