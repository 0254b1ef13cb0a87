//! 求人一覧の型定義

/// 出力CSVの列順（crawl_date は出力時に付与）
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "job_title",
    "company_name",
    "location",
    "skills_required",
    "date_posted",
    "job_link",
    "job_category",
    "work_mode",
    "crawl_date",
];

/// 1件の求人（出力テーブルの1行）
///
/// 取得できなかったフィールドは空文字。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub job_title: String,
    pub company_name: String,
    /// "; " 区切り
    pub location: String,
    /// ", " 区切り
    pub skills_required: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub date_posted: String,
    pub job_link: String,
    pub job_category: String,
    pub work_mode: String,
}

impl JobRecord {
    /// crawl_date を末尾に付けた出力行
    pub fn to_row<'a>(&'a self, crawl_date: &'a str) -> [&'a str; 9] {
        [
            self.job_title.as_str(),
            self.company_name.as_str(),
            self.location.as_str(),
            self.skills_required.as_str(),
            self.date_posted.as_str(),
            self.job_link.as_str(),
            self.job_category.as_str(),
            self.work_mode.as_str(),
            crawl_date,
        ]
    }
}

/// 巡回の終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// max_pages に到達
    #[default]
    PageLimit,
    /// 読み込み済みページのカードが0件
    EndOfResults,
    /// 読み込めないページが続いた
    ConsecutiveSkips,
}

/// 巡回統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_visited: u32,
    /// タイムアウトで読み飛ばしたページ番号
    pub pages_skipped: Vec<u32>,
    pub cards_seen: usize,
    pub cards_failed: usize,
    pub records: usize,
    pub stop_reason: StopReason,
}

/// PageWalker の結果
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    /// ページ順 → カード順
    pub records: Vec<JobRecord>,
    pub stats: CrawlStats,
}
