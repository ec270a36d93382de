use crate::config::ProbeConfig;
use crate::errors::FetchError;
use crate::flex_value::FlexValue;
use crate::model::Credential;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserInfo {
    #[serde(default)]
    pub auth: FlexValue,
    #[serde(default)]
    pub status: FlexValue,
    #[serde(default)]
    pub exp_date: FlexValue,
    #[serde(default)]
    pub max_connections: FlexValue,
    #[serde(default)]
    pub active_cons: FlexValue,
}

impl UserInfo {
    /// Field-by-field decode: a field of an unexpected shape becomes `Null`
    /// instead of rejecting the whole object.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |name: &str| value.get(name).map(FlexValue::from_json).unwrap_or_default();
        Self {
            auth: field("auth"),
            status: field("status"),
            exp_date: field("exp_date"),
            max_connections: field("max_connections"),
            active_cons: field("active_cons"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth.as_i64(), Some(flag) if flag != 0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServerInfo {
    #[serde(default)]
    pub url: FlexValue,
    #[serde(default)]
    pub port: FlexValue,
}

impl ServerInfo {
    /// `None` unless `server_info` is an object.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| object.get(name).map(FlexValue::from_json).unwrap_or_default();
        Some(Self {
            url: field("url"),
            port: field("port"),
        })
    }

    /// Base URL the panel says it lives at, as `http://host[:port]`.
    pub fn base_url(&self) -> Option<String> {
        let url = self.url.to_text().filter(|u| !u.trim().is_empty())?;
        let base = crate::extractor::insecure_base(url.trim().trim_end_matches('/'));
        let has_port = base["http://".len()..].contains(':');
        match self.port.to_text().filter(|p| !p.trim().is_empty()) {
            Some(port) if !has_port => Some(format!("{}:{}", base, port.trim())),
            _ => Some(base),
        }
    }
}

/// A raw GET capability. The HTTP implementation lives below; tests script their own.
pub trait PanelTransport: Send + Sync {
    /// Body of a 2xx response, or why there is none.
    fn get(&self, url: &str, timeout: Duration) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-backed transport. Certificate verification is off: panels routinely
/// serve self-signed or mismatched certificates.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ProbeConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| FetchError::Client(e.without_url().to_string()))?;
        Ok(Self { client })
    }
}

impl PanelTransport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout.as_secs()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        resp.text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout.as_secs()))
    }
}

/// Result of one logical fetch: decoded JSON, or the raw body when it was not JSON,
/// or neither when every attempt failed.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub json: Option<serde_json::Value>,
    pub raw: Option<String>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(json) => Self {
                json: Some(json),
                ..Default::default()
            },
            Err(_) => Self {
                raw: Some(body),
                ..Default::default()
            },
        }
    }

    fn failed(error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Short human description of what went wrong, for non-JSON or failed fetches.
    pub fn failure_summary(&self) -> String {
        match (&self.raw, &self.error) {
            (Some(raw), _) => format!("non-JSON body: {}", snippet(raw, 120)),
            (None, Some(err)) => err.to_string(),
            (None, None) => "no data".to_string(),
        }
    }
}

/// Retry and timeout budget shared by every call of one client.
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    pub retries: u32,
    pub backoff: Duration,
    pub short_timeout: Duration,
    pub listing_timeout: Duration,
}

impl RequestPolicy {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            short_timeout: Duration::from_secs(config.login_timeout_secs),
            listing_timeout: Duration::from_secs(config.listing_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XtreamClient<T> {
    transport: T,
    base_url: String,
    username: String,
    password: String,
    policy: RequestPolicy,
}

impl<T: PanelTransport> XtreamClient<T> {
    pub fn new(transport: T, credential: &Credential, policy: RequestPolicy) -> Self {
        Self {
            transport,
            base_url: credential.base_url.trim_end_matches('/').to_string(),
            username: credential.username.clone(),
            password: credential.password.clone(),
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Points every later call at `base_url` (panel-reported real server).
    pub fn rebase(&mut self, base_url: &str) {
        self.base_url = base_url.trim_end_matches('/').to_string();
    }

    /// `{base}/player_api.php?username=..&password=..[&action=..]`.
    /// Credentials are decoded first so already-encoded input is not encoded twice.
    pub fn player_api_url(&self, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/player_api.php?username={}&password={}",
            self.base_url,
            reencode(&self.username),
            reencode(&self.password)
        );
        if let Some(action) = action {
            url.push_str("&action=");
            url.push_str(action);
        }
        url
    }

    pub async fn login(&self) -> FetchOutcome {
        let url = self.player_api_url(None);
        self.fetch_json(&url, self.policy.retries, self.policy.short_timeout)
            .await
    }

    /// Bulk listing call, on the long timeout.
    pub async fn fetch_listing(&self, action: &str) -> FetchOutcome {
        let url = self.player_api_url(Some(action));
        self.fetch_json(&url, self.policy.retries, self.policy.listing_timeout)
            .await
    }

    /// Category or detail call, on the short timeout.
    pub async fn fetch_small(&self, action: &str) -> FetchOutcome {
        let url = self.player_api_url(Some(action));
        self.fetch_json(&url, self.policy.retries, self.policy.short_timeout)
            .await
    }

    /// GET with up to `retries` extra attempts and a fixed pause between them.
    /// Never fails: a non-JSON body comes back as `raw`, exhaustion as `error`.
    pub async fn fetch_json(&self, url: &str, retries: u32, timeout: Duration) -> FetchOutcome {
        let mut attempt = 0;
        loop {
            debug!(url = %mask_password(url), attempt, "panel request");
            match self.transport.get(url, timeout).await {
                Ok(body) => return FetchOutcome::from_body(body),
                Err(err) if attempt < retries => {
                    debug!(url = %mask_password(url), attempt, error = %err, "retrying");
                    attempt += 1;
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(err) => {
                    warn!(url = %mask_password(url), attempts = attempt + 1, error = %err, "giving up");
                    return FetchOutcome::failed(err);
                }
            }
        }
    }
}

static PASSWORD_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(password=)[^&\s]*").unwrap());

fn reencode(value: &str) -> String {
    let decoded = urlencoding::decode(value).unwrap_or(Cow::Borrowed(value));
    urlencoding::encode(&decoded).into_owned()
}

/// Replaces the `password=` query value with `***`.
pub fn mask_password(url: &str) -> String {
    PASSWORD_PARAM.replace_all(url, "${1}***").into_owned()
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    impl PanelTransport for Unused {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            Err(FetchError::Transport("unused".into()))
        }
    }

    fn client(user: &str, pass: &str) -> XtreamClient<Unused> {
        let policy = RequestPolicy::from_config(&ProbeConfig::default());
        XtreamClient::new(Unused, &Credential::new("http://h.tv:80/", user, pass), policy)
    }

    #[test]
    fn test_player_api_url_encodes_once() {
        let c = client("a%40b", "p&q");
        assert_eq!(
            c.player_api_url(Some("get_series")),
            "http://h.tv:80/player_api.php?username=a%40b&password=p%26q&action=get_series"
        );
    }

    #[test]
    fn test_rebase_strips_trailing_slash() {
        let mut c = client("u", "p");
        c.rebase("http://real.tv:8080/");
        assert!(c.player_api_url(None).starts_with("http://real.tv:8080/player_api.php?"));
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("http://h/player_api.php?username=u&password=secret&action=x"),
            "http://h/player_api.php?username=u&password=***&action=x"
        );
    }

    #[test]
    fn test_server_info_base_url() {
        let info = ServerInfo {
            url: FlexValue::Text("host.cc:80".into()),
            port: FlexValue::Text("8080".into()),
        };
        assert_eq!(info.base_url().as_deref(), Some("http://host.cc:80"));

        let info = ServerInfo {
            url: FlexValue::Text("https://real.tv/".into()),
            port: FlexValue::Number(2095),
        };
        assert_eq!(info.base_url().as_deref(), Some("http://real.tv:2095"));

        assert_eq!(ServerInfo::default().base_url(), None);
    }

    #[test]
    fn test_auth_flag() {
        let mut info = UserInfo::default();
        assert!(!info.is_authenticated());
        info.auth = FlexValue::Text("1".into());
        assert!(info.is_authenticated());
        info.auth = FlexValue::Number(0);
        assert!(!info.is_authenticated());
    }

    #[test]
    fn test_user_info_tolerates_odd_fields() {
        let info = UserInfo::from_json(&serde_json::json!({
            "auth": 1,
            "active_cons": [],
            "max_connections": {"n": 2},
            "exp_date": null
        }));
        assert!(info.is_authenticated());
        assert_eq!(info.active_cons, FlexValue::Null);
        assert_eq!(info.max_connections, FlexValue::Null);
        assert_eq!(info.status, FlexValue::Null);
    }

    #[test]
    fn test_server_info_must_be_object() {
        assert!(ServerInfo::from_json(&serde_json::json!("n/a")).is_none());
        let info = ServerInfo::from_json(&serde_json::json!({"url": "h.tv", "port": 80})).unwrap();
        assert_eq!(info.base_url().as_deref(), Some("http://h.tv:80"));
    }

    #[test]
    fn test_outcome_keeps_raw_text() {
        let outcome = FetchOutcome::from_body("<html>blocked</html>".into());
        assert!(outcome.json.is_none());
        assert_eq!(outcome.raw.as_deref(), Some("<html>blocked</html>"));
    }
}
