use crate::api::{PanelTransport, XtreamClient};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static EPISODE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,3})\s*[ .\-]?\s*E(\d{1,4})\b").unwrap());

/// Latest "SxxEyy" label of a series, or `None` on any missing data.
pub async fn resolve_latest_episode<T: PanelTransport>(client: &XtreamClient<T>, series_id: &str) -> Option<String> {
    let action = format!("get_series_info&series_id={}", urlencoding::encode(series_id));
    let info = client.fetch_small(&action).await.json?;
    let label = latest_episode_label(&info);
    debug!(series_id, ?label, "series detail");
    label
}

/// Picks the numerically highest season in `episodes` and labels its last episode.
///
/// The label comes from the title when it carries an `SxxEyy` tag. Otherwise it is
/// synthesized from the season number and the episode count, which is only an
/// approximation of the real episode number.
pub fn latest_episode_label(series_info: &Value) -> Option<String> {
    let episodes = series_info.get("episodes")?.as_object()?;

    let (season, list) = episodes
        .iter()
        .filter_map(|(key, list)| Some((key.trim().parse::<u32>().ok()?, list)))
        .max_by_key(|(season, _)| *season)?;

    let list = list.as_array().filter(|l| !l.is_empty())?;
    let title = list.last().and_then(|ep| ep.get("title")).and_then(Value::as_str);

    let tagged = title
        .and_then(|t| EPISODE_TAG.captures(t))
        .and_then(|caps| {
            let s: u32 = caps.get(1)?.as_str().parse().ok()?;
            let e: u32 = caps.get(2)?.as_str().parse().ok()?;
            Some(format!("S{:02}E{:02}", s, e))
        });

    Some(tagged.unwrap_or_else(|| format!("S{:02}E{:02}", season, list.len())))
}
