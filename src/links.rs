use url::Url;

/// 一覧URLからサイトのオリジン (`https://itviec.com`) を取り出す
pub fn site_origin(listing_url: &Url) -> String {
    listing_url.origin().ascii_serialization()
}

/// 求人リンクを絶対URLに正規化
///
/// 既に絶対URLならそのまま、相対パスはオリジン基準で解決する。
/// 空文字は空文字のまま。
pub fn absolutize(link: &str, origin: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return String::new();
    }
    if Url::parse(link).is_ok() {
        return link.to_string();
    }

    Url::parse(origin)
        .and_then(|base| base.join(link))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| link.to_string())
}

/// `{base_url}?page={page}`（base_url 側の page 指定は置き換える）
pub fn page_url(listing_url: &Url, page: u32) -> String {
    let kept: Vec<(String, String)> = listing_url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = listing_url.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    url.to_string()
}
