use xtream_probe_lib::api::{mask_password, HttpTransport, RequestPolicy, XtreamClient};
use xtream_probe_lib::config::ProbeConfig;
use xtream_probe_lib::extractor;

/// Prints the raw login response for every credential found in the arguments:
/// pretty JSON when the panel answers with JSON, the body otherwise.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let credentials = extractor::extract(&text);
    if credentials.is_empty() {
        println!("⚠️ No credentials found. Pass a get.php / player_api.php URL.");
        return Ok(());
    }

    let config = ProbeConfig::load()?;
    for credential in credentials {
        let client = XtreamClient::new(
            HttpTransport::new(&config)?,
            &credential,
            RequestPolicy::from_config(&config),
        );
        println!("🧩 API URL: {}", mask_password(&client.player_api_url(None)));

        let outcome = client.login().await;
        match (&outcome.json, &outcome.raw) {
            (Some(json), _) => {
                println!("✅ Panel answered with JSON:");
                println!("{}", serde_json::to_string_pretty(json)?);
            }
            (None, Some(raw)) => {
                println!("⚠️ Response is not valid JSON:");
                println!("{}", raw);
            }
            (None, None) => println!("❌ {}", outcome.failure_summary()),
        }
        println!();
    }
    Ok(())
}
