use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Driver;

const WINDOW_SIZE: (u32, u32) = (1920, 1080);
const CDP_REQUEST_TIMEOUT_SECS: u64 = 60;

const SCROLL_INTO_VIEW_JS: &str = "function() { this.scrollIntoView({block: 'center'}); }";
const CLICK_JS: &str = "function() { this.click(); }";

/// Chromium を CDP で操作する Driver
pub struct ChromeDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: PathBuf,
}

impl ChromeDriver {
    /// ブラウザを起動して空ページを開く
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Launching browser (headless={})...", config.headless);

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("jobboard-scraper-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1);

        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(CDP_REQUEST_TIMEOUT_SECS))
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking");

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder.build().map_err(ScraperError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ハンドラータスクを起動
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let mut driver = Self {
            browser: Some(browser),
            page: None,
            handler: Some(handler),
            user_data_dir,
        };

        let page = match driver.open_blank_page().await {
            Ok(page) => page,
            Err(e) => {
                // 起動済みのプロセスを残さない
                let _ = driver.close().await;
                return Err(e);
            }
        };
        driver.page = Some(page);

        info!("Browser launched");
        Ok(driver)
    }

    async fn open_blank_page(&self) -> Result<Page, ScraperError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Browser not initialized".into()))?;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))
    }

    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Driver("Browser session already closed".into()))
    }
}

/// CDPエラーを分類する（接続断は致命的）
fn cdp_error(context: &str, e: CdpError) -> ScraperError {
    match e {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            ScraperError::Driver(format!("{}: {}", context, e))
        }
        other => ScraperError::JavaScript(format!("{}: {}", context, other)),
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        let page = self.page()?;
        page.goto(url).await.map_err(|e| match cdp_error(url, e) {
            ScraperError::JavaScript(msg) => ScraperError::Navigation(msg),
            fatal => fatal,
        })?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, ScraperError> {
        self.page()?
            .find_elements(selector)
            .await
            .map_err(|e| cdp_error(selector, e))
    }

    async fn find_within(
        &self,
        scope: &Element,
        selector: &str,
    ) -> Result<Vec<Element>, ScraperError> {
        scope
            .find_elements(selector)
            .await
            .map_err(|e| cdp_error(selector, e))
    }

    async fn read_text(&self, element: &Element) -> Result<String, ScraperError> {
        let text = element
            .inner_text()
            .await
            .map_err(|e| cdp_error("innerText", e))?;
        Ok(text.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    async fn read_attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        element
            .attribute(name)
            .await
            .map_err(|e| cdp_error(name, e))
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), ScraperError> {
        element
            .call_js_fn(SCROLL_INTO_VIEW_JS, false)
            .await
            .map_err(|e| cdp_error("scrollIntoView", e))?;
        Ok(())
    }

    /// ページ側のスクリプトでクリック（オーバーレイに遮られない）
    async fn click(&self, element: &Element) -> Result<(), ScraperError> {
        element
            .call_js_fn(CLICK_JS, false)
            .await
            .map_err(|e| cdp_error("click", e))?;
        Ok(())
    }

    async fn screenshot_base64(&self) -> Result<Option<String>, ScraperError> {
        let screenshot = self
            .page()?
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| cdp_error("screenshot", e))?;
        Ok(Some(
            base64::engine::general_purpose::STANDARD.encode(&screenshot),
        ))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser did not close cleanly, killing process: {}", e);
                if let Some(Err(e)) = browser.kill().await {
                    warn!("Failed to kill browser process: {}", e);
                }
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser exit: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("Failed to remove {:?}: {}", self.user_data_dir, e);
        }

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_fatal() {
        assert!(cdp_error("find", CdpError::NoResponse).is_fatal());
    }

    #[test]
    fn test_lookup_errors_are_recoverable() {
        let err = cdp_error("div.job-card", CdpError::NotFound);
        assert!(matches!(err, ScraperError::JavaScript(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: cargo test test_chrome_driver_smoke -- --ignored --nocapture
    async fn test_chrome_driver_smoke() {
        let config = ScraperConfig::from_env().with_headless(true);
        let mut driver = ChromeDriver::launch(&config)
            .await
            .expect("Failed to launch browser");

        driver
            .navigate("https://itviec.com/it-jobs?page=1")
            .await
            .expect("navigation failed");
        let ready = driver
            .wait_until_present(
                &config.selectors.readiness(),
                config.page_timeout,
                config.poll_interval,
            )
            .await
            .expect("wait failed");
        println!("listing ready: {}", ready);

        driver.close().await.expect("close failed");
    }
}
