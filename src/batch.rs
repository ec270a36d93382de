use crate::api::{HttpTransport, PanelTransport};
use crate::config::ProbeConfig;
use crate::errors::{FetchError, LoginFailure};
use crate::extractor;
use crate::model::{AccountStatus, Credential, ProbeResult};
use crate::orchestrator::probe_account;
use crate::search::SearchQuery;
use futures::stream::{self, StreamExt};
use tracing::info;

/// Extracts credentials from `text` and probes each one over HTTP.
/// An empty result means no credential was recognised.
pub async fn run_batch(text: &str, search: Option<&str>, config: &ProbeConfig) -> Vec<ProbeResult> {
    let credentials = extractor::extract(text);
    probe_credentials(credentials, search, config, |_| HttpTransport::new(config)).await
}

/// Probes every credential with at most `max_concurrent_accounts` in flight.
/// Each orchestration gets a fresh transport from `make_transport`, dropped when it finishes.
pub async fn probe_credentials<T, F>(
    credentials: Vec<Credential>,
    search: Option<&str>,
    config: &ProbeConfig,
    make_transport: F,
) -> Vec<ProbeResult>
where
    T: PanelTransport,
    F: Fn(&Credential) -> Result<T, FetchError>,
{
    let query = SearchQuery::parse(search);
    let now = chrono::Utc::now().timestamp();
    info!(count = credentials.len(), "probing credentials");

    let results: Vec<ProbeResult> = stream::iter(credentials)
        .map(|credential| {
            let transport = make_transport(&credential);
            let query = query.as_ref();
            async move {
                match transport {
                    Ok(transport) => probe_account(transport, credential, query, config, now).await,
                    Err(err) => ProbeResult::login_failed(credential, LoginFailure::NoResponse(err)),
                }
            }
        })
        .buffered(config.max_concurrent_accounts.max(1))
        .collect()
        .await;

    sort_results(results)
}

/// Active accounts first; discovery order kept within each group.
pub fn sort_results(mut results: Vec<ProbeResult>) -> Vec<ProbeResult> {
    results.sort_by_key(|r| r.status() != AccountStatus::Active);
    results
}
