use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub user_agent: String,
    /// Login, category and series-info calls
    pub login_timeout_secs: u64,
    /// Full listing calls, which can carry tens of thousands of entries
    pub listing_timeout_secs: u64,
    /// Extra attempts after the first failure
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub max_concurrent_accounts: usize,
    pub max_concurrent_series_lookups: usize,
    /// Matched series beyond this keep no episode detail
    pub max_series_lookups: usize,
    /// Host suffixes the operator's player accepts. Display only; empty disables the check.
    pub accepted_tlds: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            user_agent: "IPTV Smarters Pro".to_string(),
            login_timeout_secs: 15,
            listing_timeout_secs: 25,
            retries: 2,
            retry_backoff_ms: 1000,
            max_concurrent_accounts: 10,
            max_concurrent_series_lookups: 3,
            max_series_lookups: 25,
            accepted_tlds: Vec::new(),
        }
    }
}

impl ProbeConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "xtream-probe", "xtream-probe")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the platform config file, or defaults when there is none.
    pub fn load() -> Result<Self, anyhow::Error> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: ProbeConfig = serde_json::from_str(&content)?;
        Ok(config.validate())
    }

    /// Concurrency bounds of zero would stall the pools.
    pub fn validate(mut self) -> Self {
        self.max_concurrent_accounts = self.max_concurrent_accounts.max(1);
        self.max_concurrent_series_lookups = self.max_concurrent_series_lookups.max(1);
        self.login_timeout_secs = self.login_timeout_secs.max(1);
        self.listing_timeout_secs = self.listing_timeout_secs.max(1);
        self
    }
}
