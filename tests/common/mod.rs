#![allow(dead_code)]

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use xtream_probe_lib::api::PanelTransport;
use xtream_probe_lib::config::ProbeConfig;
use xtream_probe_lib::errors::FetchError;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Body(String),
    Status(u16),
    Down,
}

/// In-memory panel answering by action name (`login` for the bare call,
/// `get_series_info:<id>` for series details). Unscripted actions are `Down`.
/// The last scripted reply of an action repeats once its queue is drained.
#[derive(Clone, Default)]
pub struct ScriptedPanel {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    timeouts: Arc<Mutex<Vec<(String, Duration)>>>,
}

impl ScriptedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, key: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn json(self, key: &str, value: Value) -> Self {
        self.on(key, Reply::Json(value))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_keys(&self) -> Vec<String> {
        self.calls().iter().map(|url| key_of(url)).collect()
    }

    /// `(key, timeout)` of every call, in call order.
    pub fn timeouts(&self) -> Vec<(String, Duration)> {
        self.timeouts.lock().unwrap().clone()
    }

    fn next_reply(&self, key: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Down),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Down),
            None => Reply::Down,
        }
    }
}

impl PanelTransport for ScriptedPanel {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.timeouts.lock().unwrap().push((key_of(url), timeout));
        match self.next_reply(&key_of(url)) {
            Reply::Json(value) => Ok(value.to_string()),
            Reply::Body(body) => Ok(body),
            Reply::Status(code) => Err(FetchError::HttpStatus(code)),
            Reply::Down => Err(FetchError::Transport("connection refused".to_string())),
        }
    }
}

/// Shared in-flight counter with its high-water mark.
#[derive(Clone, Default)]
pub struct Gauge {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Wraps a `ScriptedPanel`; calls whose key starts with `watched` are held
/// open for a moment and counted on the gauge.
#[derive(Clone)]
pub struct GaugedPanel {
    inner: ScriptedPanel,
    watched: &'static str,
    gauge: Gauge,
}

impl GaugedPanel {
    pub fn new(inner: ScriptedPanel, watched: &'static str, gauge: Gauge) -> Self {
        Self { inner, watched, gauge }
    }
}

impl PanelTransport for GaugedPanel {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let watched = key_of(url).starts_with(self.watched);
        if watched {
            let now = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let reply = self.inner.get(url, timeout).await;
        if watched {
            self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        reply
    }
}

fn param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

pub fn key_of(url: &str) -> String {
    match param(url, "action") {
        None => "login".to_string(),
        Some("get_series_info") => format!("get_series_info:{}", param(url, "series_id").unwrap_or("")),
        Some(action) => action.to_string(),
    }
}

pub fn test_config() -> ProbeConfig {
    ProbeConfig {
        retries: 1,
        retry_backoff_ms: 0,
        ..Default::default()
    }
}

pub fn active_login() -> Value {
    serde_json::json!({
        "user_info": {"auth": 1, "exp_date": "0", "status": "Active", "active_cons": "1", "max_connections": "2"},
        "server_info": {"url": "host.cc:80"}
    })
}

pub fn names(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|n| serde_json::json!({"name": n})).collect())
}
