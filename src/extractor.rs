//! Recovers panel credentials from whatever the operator pasted.
//!
//! Two pattern families are tried in order and never merged:
//! 1. URLs pointing at `get.php` (playlist) or `player_api.php` (API) with
//!    `username` / `password` in the query string.
//! 2. Loose `Host ➤ ...`, `User ➤ ...`, `Pass ➤ ...` labels, only when no URL matched.

use crate::model::Credential;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static PANEL_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bhttps?://([a-z0-9](?:[a-z0-9.\-]*[a-z0-9])?(?::\d{1,5})?)/(?:[^\s?"'<>]*/)?(?:get|player_api)\.php\?([^\s"'<>]+)"#,
    )
    .unwrap()
});

// A label starts a line or follows a non-word character other than `/` and `.`,
// so `user` inside `http://user.example.tv` is not a label.
const LABEL_START: &str = r"(?:^|[^\w/.])";

// At least one separator (":", "=", arrows, dashes, bullets, spacing) after the label,
// all on the label's own line.
const SEPARATORS: &str = r"[\p{Zs}\t:=>|\-➤➜→⇒•»]+";

static HOST_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?im){}(?:host|real|http-port)\b{}((?:https?://)?[a-z0-9\-]+(?:\.[a-z0-9\-]+)+(?::\d{{1,5}})?)",
        LABEL_START, SEPARATORS
    ))
    .unwrap()
});

static USER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?im){}(?:username|user)\b{}([^\s]+)",
        LABEL_START, SEPARATORS
    ))
    .unwrap()
});

static PASS_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?im){}(?:password|pass)\b{}([^\s]+)",
        LABEL_START, SEPARATORS
    ))
    .unwrap()
});

/// Extracts a deduplicated, first-seen-ordered list of credentials.
/// An empty result means nothing usable was found.
pub fn extract(text: &str) -> Vec<Credential> {
    let from_urls = extract_from_urls(text);
    if !from_urls.is_empty() {
        return from_urls;
    }
    extract_from_labels(text).into_iter().collect()
}

fn extract_from_urls(text: &str) -> Vec<Credential> {
    let found = PANEL_URL.captures_iter(text).filter_map(|caps| {
        let authority = caps.get(1)?.as_str();
        let query = caps.get(2)?.as_str();
        let username = query_param(query, "username")?;
        let password = query_param(query, "password")?;
        Some(Credential::new(insecure_base(authority), username, password))
    });
    dedup(found)
}

/// Single credential from labelled fields; first occurrence of each label wins.
fn extract_from_labels(text: &str) -> Option<Credential> {
    let host = first_capture(&HOST_LABEL, text)?;
    let username = first_capture(&USER_LABEL, text)?;
    let password = first_capture(&PASS_LABEL, text)?;
    Some(Credential::new(insecure_base(&host), username, password))
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Raw (still percent-encoded) value of `key`, trimmed; empty values are dropped.
/// HTML-escaped separators (`&amp;`) are accepted.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.strip_prefix("amp;").unwrap_or(k), v))
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `scheme://host[:port]` with the scheme forced to plain http.
pub fn insecure_base(host: &str) -> String {
    let host = host.trim();
    let lower = host.to_ascii_lowercase();
    let bare = if lower.starts_with("https://") {
        &host[8..]
    } else if lower.starts_with("http://") {
        &host[7..]
    } else {
        host
    };
    let authority = bare.split('/').next().unwrap_or(bare);
    format!("http://{}", authority)
}

fn dedup(credentials: impl Iterator<Item = Credential>) -> Vec<Credential> {
    let mut seen = HashSet::new();
    credentials.filter(|c| seen.insert(c.clone())).collect()
}
