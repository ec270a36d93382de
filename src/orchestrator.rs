//! Per-credential pipeline:
//! `Init -> LoggingIn -> {LoginFailed | Authenticated} -> ProbingContent -> Done`.

use crate::api::{FetchOutcome, PanelTransport, RequestPolicy, ServerInfo, UserInfo, XtreamClient};
use crate::config::ProbeConfig;
use crate::errors::{FetchError, LoginFailure};
use crate::model::{AccountInfo, AccountStatus, ContentKind, Credential, ExpiryLabel, ProbeResult, SearchMatch};
use crate::probe::{probe_content, ProbeOutput};
use crate::search::SearchQuery;
use crate::series::resolve_latest_episode;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Runs the whole pipeline for one credential. Every failure ends up inside the
/// returned record; nothing escapes to the caller.
pub async fn probe_account<T: PanelTransport>(
    transport: T,
    credential: Credential,
    query: Option<&SearchQuery>,
    config: &ProbeConfig,
    now: i64,
) -> ProbeResult {
    let mut client = XtreamClient::new(transport, &credential, RequestPolicy::from_config(config));

    debug!(base = %credential.base_url, user = %credential.username, "logging in");
    let account = match login(&client, now).await {
        Ok(account) => account,
        Err(failure) => {
            info!(base = %credential.base_url, %failure, "login failed");
            return ProbeResult::login_failed(credential, failure);
        }
    };

    if account.real_server_url != client.base_url() {
        debug!(from = %client.base_url(), to = %account.real_server_url, "panel reports another server");
        client.rebase(&account.real_server_url);
    }

    let (live, vod, series) = tokio::join!(
        probe_content(&client, ContentKind::Live),
        probe_content(&client, ContentKind::Vod),
        probe_content(&client, ContentKind::Series),
    );

    let matches = match query {
        Some(query) => search(&client, query, [&live, &vod, &series], config).await,
        None => Vec::new(),
    };

    info!(
        base = %credential.base_url,
        live = live.count.count,
        vod = vod.count.count,
        series = series.count.count,
        matches = matches.len(),
        "account probed"
    );

    ProbeResult {
        credential,
        account,
        live: live.count,
        vod: vod.count,
        series: series.count,
        matches,
        login_failure: None,
    }
}

async fn login<T: PanelTransport>(client: &XtreamClient<T>, now: i64) -> Result<AccountInfo, LoginFailure> {
    let outcome = client.login().await;
    let json = match outcome {
        FetchOutcome { json: Some(json), .. } => json,
        FetchOutcome { raw: Some(raw), .. } => return Err(LoginFailure::NotJson(snippet(&raw))),
        FetchOutcome { error, .. } => {
            return Err(LoginFailure::NoResponse(
                error.unwrap_or_else(|| FetchError::Transport("no response".to_string())),
            ))
        }
    };
    parse_login(json, client.base_url(), now)
}

/// Turns a decoded login response into account metadata.
pub fn parse_login(json: serde_json::Value, base_url: &str, now: i64) -> Result<AccountInfo, LoginFailure> {
    let user = json
        .get("user_info")
        .filter(|u| u.is_object())
        .map(UserInfo::from_json)
        .ok_or(LoginFailure::MissingUserInfo)?;
    if !user.is_authenticated() {
        return Err(LoginFailure::AuthRejected);
    }

    let real_server_url = json
        .get("server_info")
        .and_then(ServerInfo::from_json)
        .and_then(|server| server.base_url())
        .unwrap_or_else(|| base_url.trim_end_matches('/').to_string());

    Ok(AccountInfo {
        status: AccountStatus::Active,
        expiry: ExpiryLabel::classify(&user.exp_date, user.status.to_text().as_deref(), now),
        active_connections: user.active_cons.as_count(),
        max_connections: user.max_connections.as_count(),
        real_server_url,
    })
}

/// Matches the query against every fully listed kind, then enriches series
/// matches with their latest episode through a small bounded pool.
async fn search<T: PanelTransport>(
    client: &XtreamClient<T>,
    query: &SearchQuery,
    outputs: [&ProbeOutput; 3],
    config: &ProbeConfig,
) -> Vec<SearchMatch> {
    let mut matches = Vec::new();
    let mut series_ids = Vec::new();

    for output in outputs {
        // CategoriesOnly and Unavailable carry no items
        for item in output.items.iter().filter(|item| query.matches(&item.name)) {
            if output.count.kind == ContentKind::Series {
                series_ids.push((matches.len(), item.series_id.clone()));
            }
            matches.push(SearchMatch {
                kind: output.count.kind,
                name: item.name.clone(),
                detail: None,
            });
        }
    }

    let lookups: Vec<(usize, String)> = series_ids
        .into_iter()
        .filter_map(|(index, id)| Some((index, id?)))
        .take(config.max_series_lookups)
        .collect();

    let details: Vec<(usize, Option<String>)> = stream::iter(lookups)
        .map(|(index, id)| async move { (index, resolve_latest_episode(client, &id).await) })
        .buffer_unordered(config.max_concurrent_series_lookups.max(1))
        .collect()
        .await;

    for (index, detail) in details {
        matches[index].detail = detail;
    }
    matches
}

fn snippet(raw: &str) -> String {
    let flat = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(160).collect()
}
