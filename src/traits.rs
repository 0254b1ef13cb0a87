use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::ScraperError;

/// 抽出処理が必要とするブラウザ操作
///
/// `Element` は描画中ページへの一時的な参照。次のナビゲーションや
/// クリックで無効になりうるため、取得した呼び出しの中でのみ使うこと。
#[async_trait]
pub trait Driver: Send + Sync {
    type Element: Send + Sync;

    /// URLへ遷移（読み込み完了まで待つ）
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// ページ全体からCSSセレクタに一致する要素をDOM順で取得
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, ScraperError>;

    /// 要素配下からCSSセレクタに一致する要素をDOM順で取得
    async fn find_within(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, ScraperError>;

    /// 表示テキスト（前後の空白は除去、無ければ空文字）
    async fn read_text(&self, element: &Self::Element) -> Result<String, ScraperError>;

    async fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), ScraperError>;

    async fn click(&self, element: &Self::Element) -> Result<(), ScraperError>;

    /// デバッグ用スクリーンショット (base64 PNG)
    async fn screenshot_base64(&self) -> Result<Option<String>, ScraperError> {
        Ok(None)
    }

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// いずれかのセレクタに一致する要素が現れるまで待機
    ///
    /// 出現すれば `true`、タイムアウトなら `false`。
    async fn wait_until_present(
        &self,
        selectors: &[String],
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool, ScraperError> {
        let driver = self;
        wait_until(timeout, poll_interval, move || async move {
            for selector in selectors {
                if !driver.find_all(selector).await?.is_empty() {
                    return Ok(true);
                }
            }
            Ok::<_, ScraperError>(false)
        })
        .await
    }
}

/// 条件が `true` を返すまで `poll_interval` ごとに評価する
///
/// 期限内に満たされれば `true`、タイムアウトなら `false`。
/// 回復可能なエラーは「未成立」として扱い、致命的エラーは即座に返す。
pub async fn wait_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    mut condition: F,
) -> Result<bool, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ScraperError>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        match condition().await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("Wait condition check failed: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
