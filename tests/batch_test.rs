mod common;

use common::{active_login, names, test_config, Gauge, GaugedPanel, ScriptedPanel};
use serde_json::json;
use xtream_probe_lib::batch::{probe_credentials, run_batch};
use xtream_probe_lib::errors::{FetchError, LoginFailure};
use xtream_probe_lib::extractor::extract;
use xtream_probe_lib::model::AccountStatus;

fn working_panel() -> ScriptedPanel {
    ScriptedPanel::new()
        .json("login", active_login())
        .json("get_live_streams", names(&["CNN"]))
        .json("get_vod_streams", names(&["Heat"]))
        .json("get_series", names(&["Dark"]))
}

fn rejecting_panel() -> ScriptedPanel {
    ScriptedPanel::new().json("login", json!({"user_info": {"auth": 0}}))
}

#[tokio::test]
async fn test_active_accounts_sorted_first() {
    let text = "\
        http://dead1.tv/get.php?username=a&password=b\n\
        http://good1.tv/get.php?username=a&password=b\n\
        http://dead2.tv/get.php?username=a&password=b\n\
        http://good2.tv/player_api.php?username=a&password=b\n";
    let credentials = extract(text);
    assert_eq!(credentials.len(), 4);

    let results = probe_credentials(credentials, None, &test_config(), |c| {
        Ok(if c.base_url.contains("good") { working_panel() } else { rejecting_panel() })
    })
    .await;

    let order: Vec<&str> = results.iter().map(|r| r.credential.base_url.as_str()).collect();
    assert_eq!(
        order,
        vec!["http://good1.tv", "http://good2.tv", "http://dead1.tv", "http://dead2.tv"]
    );
    assert_eq!(results[0].status(), AccountStatus::Active);
    assert_eq!(results[3].status(), AccountStatus::Failed);
}

#[tokio::test]
async fn test_each_credential_gets_its_own_transport() {
    let text = "http://a.tv/get.php?username=x&password=y http://b.tv/get.php?username=x&password=y";
    let panels = std::sync::Mutex::new(Vec::new());
    let results = probe_credentials(extract(text), None, &test_config(), |_| {
        let panel = working_panel();
        panels.lock().unwrap().push(panel.clone());
        Ok(panel)
    })
    .await;

    assert_eq!(results.len(), 2);
    let panels = panels.into_inner().unwrap();
    assert_eq!(panels.len(), 2);
    for panel in panels {
        assert_eq!(panel.calls().len(), 4);
    }
}

#[tokio::test]
async fn test_transport_setup_failure_is_a_failed_result() {
    let results = probe_credentials(
        extract("http://a.tv/get.php?username=x&password=y"),
        None,
        &test_config(),
        |_| Err::<ScriptedPanel, _>(FetchError::Client("no tls backend".into())),
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status(), AccountStatus::Failed);
    assert_eq!(
        results[0].login_failure,
        Some(LoginFailure::NoResponse(FetchError::Client("no tls backend".into())))
    );
}

#[tokio::test]
async fn test_search_passed_to_every_account() {
    let text = "Host: panel.example.tv:8080\nUser: joe\nPass: pw";
    let results = probe_credentials(extract(text), Some("heat"), &test_config(), |_| Ok(working_panel())).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].credential.base_url, "http://panel.example.tv:8080");
    assert_eq!(results[0].matches.len(), 1);
    assert_eq!(results[0].matches[0].name, "Heat");
}

#[tokio::test]
async fn test_no_credentials_no_results() {
    let results = probe_credentials(extract("hello world"), Some("x"), &test_config(), |_| Ok(working_panel())).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_accounts_in_flight_bounded() {
    let text: String = (0..10)
        .map(|i| format!("http://p{}.tv/get.php?username=a&password=b\n", i))
        .collect();
    let credentials = extract(&text);
    assert_eq!(credentials.len(), 10);

    let gauge = Gauge::default();
    let mut config = test_config();
    config.max_concurrent_accounts = 4;
    let results = probe_credentials(credentials, None, &config, |_| {
        Ok(GaugedPanel::new(rejecting_panel(), "login", gauge.clone()))
    })
    .await;

    assert_eq!(results.len(), 10);
    assert_eq!(gauge.peak(), 4);
}

#[tokio::test]
async fn test_run_batch_without_credentials_makes_no_calls() {
    let results = run_batch("no panel lines here", Some("news"), &test_config()).await;
    assert!(results.is_empty());
}
