use serde::Serialize;
use thiserror::Error;

/// Failure of a single GET against a panel, after which the caller may retry.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum FetchError {
    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// DNS, connect, TLS or mid-body socket failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Request exceeded its timeout budget
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Panel answered with a non-2xx status
    #[error("Panel returned HTTP {0}")]
    HttpStatus(u16),

    /// Headers arrived but the body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        // The URL carries the password in its query string.
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Timeout(timeout_secs)
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Why a credential ended in `LoginFailed`.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail")]
pub enum LoginFailure {
    /// Retries exhausted without any body
    #[error("No response from panel: {0}")]
    NoResponse(FetchError),

    /// Body arrived but was not JSON (HTML error page, block notice, ...)
    #[error("Panel response is not JSON: {0}")]
    NotJson(String),

    /// JSON without a `user_info` object
    #[error("Panel response has no user_info section")]
    MissingUserInfo,

    /// `user_info.auth` zero or absent
    #[error("Panel rejected the credentials")]
    AuthRejected,
}

impl LoginFailure {
    /// Operator-facing hint for the report.
    pub fn suggestion(&self) -> &'static str {
        match self {
            LoginFailure::NoResponse(FetchError::Timeout(_)) => {
                "Panel is slow or offline. Try again later."
            }
            LoginFailure::NoResponse(FetchError::HttpStatus(_)) => {
                "Panel refused the request. The line may be banned or the path blocked."
            }
            LoginFailure::NoResponse(_) => {
                "Host is unreachable. Check the address or try from another network."
            }
            LoginFailure::NotJson(_) => {
                "Panel answered with a page instead of the API. The API may be disabled or blocked."
            }
            LoginFailure::MissingUserInfo => "Host does not look like an Xtream Codes panel.",
            LoginFailure::AuthRejected => "Username or password is wrong, or the line expired.",
        }
    }
}
