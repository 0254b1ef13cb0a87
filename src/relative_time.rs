//! 「15 hours ago」形式の相対時刻を絶対時刻へ変換する

use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// 相対時刻テキストを `now` 基準の絶対時刻に変換
///
/// 最初の整数 (ASCII数字) を量、単位は minute → hour → day の順で部分一致判定する。
/// 空文字・数値なし・未対応の単位 (week, month など) は `now` をそのまま返す。
pub fn normalize(text: &str, now: NaiveDateTime) -> NaiveDateTime {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return now;
    }

    let amount = match FIRST_NUMBER
        .find(&lowered)
        .and_then(|m| m.as_str().parse::<i64>().ok())
    {
        Some(n) => n,
        None => return now,
    };

    let offset = if lowered.contains("minute") {
        Duration::try_minutes(amount)
    } else if lowered.contains("hour") {
        Duration::try_hours(amount)
    } else if lowered.contains("day") {
        Duration::try_days(amount)
    } else {
        None
    };

    offset
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(now)
}

/// 秒精度の `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

pub fn normalize_to_string(text: &str, now: NaiveDateTime) -> String {
    format_timestamp(normalize(text, now))
}
