use crate::errors::LoginFailure;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

/// One panel login recovered from pasted text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Credential {
    pub base_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Credential {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountStatus {
    Active,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExpiryLabel {
    Unlimited,
    Timestamp(NaiveDate),
    Unknown,
}

impl ExpiryLabel {
    /// Classifies the panel's `exp_date` against `now` (Unix seconds).
    ///
    /// Missing, blank, zero or non-numeric values count as "no expiry" only when
    /// the panel also reports the line as Active. Timestamps beyond twice the
    /// current time are placeholder "never expires" sentinels.
    pub fn classify(exp_date: &crate::flex_value::FlexValue, status: Option<&str>, now: i64) -> Self {
        let is_active = status
            .map(|s| s.trim().eq_ignore_ascii_case("active"))
            .unwrap_or(false);

        match exp_date.as_i64().filter(|ts| *ts > 0) {
            None if is_active => ExpiryLabel::Unlimited,
            None => ExpiryLabel::Unknown,
            Some(ts) if ts > now.saturating_mul(2) => ExpiryLabel::Unlimited,
            Some(ts) => DateTime::from_timestamp(ts, 0)
                .map(|dt| ExpiryLabel::Timestamp(dt.date_naive()))
                .unwrap_or(ExpiryLabel::Unknown),
        }
    }

    pub fn display(&self) -> String {
        match self {
            ExpiryLabel::Unlimited => "Unlimited".to_string(),
            ExpiryLabel::Timestamp(date) => date.format("%Y-%m-%d").to_string(),
            ExpiryLabel::Unknown => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub status: AccountStatus,
    pub expiry: ExpiryLabel,
    pub active_connections: u32,
    pub max_connections: u32,
    /// Base used for every call after login; may differ from the pasted host.
    pub real_server_url: String,
}

impl AccountInfo {
    fn failed(base_url: &str) -> Self {
        Self {
            status: AccountStatus::Failed,
            expiry: ExpiryLabel::Unknown,
            active_connections: 0,
            max_connections: 0,
            real_server_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentKind {
    Live,
    Vod,
    Series,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Live, ContentKind::Vod, ContentKind::Series];

    pub fn listing_action(&self) -> &'static str {
        match self {
            ContentKind::Live => "get_live_streams",
            ContentKind::Vod => "get_vod_streams",
            ContentKind::Series => "get_series",
        }
    }

    pub fn categories_action(&self) -> &'static str {
        match self {
            ContentKind::Live => "get_live_categories",
            ContentKind::Vod => "get_vod_categories",
            ContentKind::Series => "get_series_categories",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ContentKind::Live => "Channels",
            ContentKind::Vod => "Movies",
            ContentKind::Series => "Series",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountMethod {
    FullList,
    /// `count` is the number of categories, not items.
    CategoriesOnly,
    Unavailable,
}

/// What the full-listing call itself produced, before any fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ListingOutcome {
    Listed,
    Empty,
    /// Decoded, but not an array (`{}` from panels that block enumeration)
    NotAList,
    /// No usable body after retries, or a body that was not JSON
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentCount {
    pub kind: ContentKind,
    pub count: usize,
    pub method: CountMethod,
    pub listing: ListingOutcome,
}

impl ContentCount {
    pub fn unavailable(kind: ContentKind, listing: ListingOutcome) -> Self {
        Self {
            kind,
            count: 0,
            method: CountMethod::Unavailable,
            listing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub kind: ContentKind,
    pub name: String,
    /// Latest "SxxEyy" label, series only; `None` when the lookup failed or was skipped.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub credential: Credential,
    pub account: AccountInfo,
    pub live: ContentCount,
    pub vod: ContentCount,
    pub series: ContentCount,
    pub matches: Vec<SearchMatch>,
    pub login_failure: Option<LoginFailure>,
}

impl ProbeResult {
    /// Terminal `LoginFailed` record: zero counts, no matches.
    pub fn login_failed(credential: Credential, failure: LoginFailure) -> Self {
        let not_probed = || ListingOutcome::Failed("not probed".to_string());
        Self {
            account: AccountInfo::failed(&credential.base_url),
            live: ContentCount::unavailable(ContentKind::Live, not_probed()),
            vod: ContentCount::unavailable(ContentKind::Vod, not_probed()),
            series: ContentCount::unavailable(ContentKind::Series, not_probed()),
            matches: Vec::new(),
            login_failure: Some(failure),
            credential,
        }
    }

    pub fn status(&self) -> AccountStatus {
        self.account.status
    }

    pub fn count(&self, kind: ContentKind) -> &ContentCount {
        match kind {
            ContentKind::Live => &self.live,
            ContentKind::Vod => &self.vod,
            ContentKind::Series => &self.series,
        }
    }

    pub fn matches_of(&self, kind: ContentKind) -> impl Iterator<Item = &SearchMatch> {
        self.matches.iter().filter(move |m| m.kind == kind)
    }
}
