//! URL normalization used to detect duplicate search results.

use url::Url;

/// Query parameters that only track the click and never change the page.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "ref", "mc_cid", "mc_eid"];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Normalize a URL into a comparison key.
///
/// http and https collapse to the same key, a leading `www.` is dropped,
/// the fragment and tracking parameters are removed, remaining parameters
/// are sorted and a trailing `/` is stripped from the path. Text that does
/// not parse as a URL is compared by its trimmed lowercase form.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let url = match Url::parse(trimmed) {
        Ok(u) if u.host_str().is_some() => u,
        _ => return trimmed.to_lowercase(),
    };

    let host = url
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_lowercase())
        .unwrap_or_default();

    let mut key = match url.scheme() {
        "http" | "https" => String::new(),
        other => format!("{}://", other),
    };
    key.push_str(&host);
    if let Some(port) = url.port() {
        key.push_str(&format!(":{}", port));
    }
    key.push_str(url.path().trim_end_matches('/'));

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !params.is_empty() {
        params.sort();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        key.push('?');
        key.push_str(&query);
    }

    key
}

/// Lowercase host without a leading `www.`.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_lowercase())
}
