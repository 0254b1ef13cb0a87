use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("ブラウザセッション切断: {0}")]
    Driver(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSV書き込みエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSONエラー: {0}")]
    Json(String),
}

impl ScraperError {
    /// ブラウザセッション自体が使えなくなったエラーか
    ///
    /// true の場合は巡回全体を中断する。それ以外はページ/カード単位で回復する。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScraperError::BrowserInit(_) | ScraperError::Navigation(_) | ScraperError::Driver(_)
        )
    }
}
