use crate::api::{PanelTransport, XtreamClient};
use crate::flex_value::FlexValue;
use crate::model::{ContentCount, ContentKind, CountMethod, ListingOutcome};
use serde_json::Value;
use tracing::{debug, warn};

/// One enumerable entry kept for searching.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedItem {
    pub name: String,
    /// `series_id`, only present for series listings
    pub series_id: Option<String>,
}

/// Count plus the items behind it (empty unless `FullList`).
/// Items are held only until search has run.
#[derive(Debug, Clone)]
pub struct ProbeOutput {
    pub count: ContentCount,
    pub items: Vec<ListedItem>,
}

/// Full listing first; on empty, non-array or failed responses the category
/// listing is used as a coarse existence signal.
pub async fn probe_content<T: PanelTransport>(client: &XtreamClient<T>, kind: ContentKind) -> ProbeOutput {
    let listing = client.fetch_listing(kind.listing_action()).await;

    let outcome = match &listing.json {
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let items: Vec<ListedItem> = entries.iter().map(|entry| listed_item(entry, kind)).collect();
            debug!(?kind, count = items.len(), "full listing");
            return ProbeOutput {
                count: ContentCount {
                    kind,
                    count: items.len(),
                    method: CountMethod::FullList,
                    listing: ListingOutcome::Listed,
                },
                items,
            };
        }
        Some(Value::Array(_)) => ListingOutcome::Empty,
        Some(_) => ListingOutcome::NotAList,
        None => ListingOutcome::Failed(listing.failure_summary()),
    };

    debug!(?kind, ?outcome, "listing unusable, trying categories");
    let categories = client.fetch_small(kind.categories_action()).await;
    let count = match categories.json {
        Some(Value::Array(cats)) if !cats.is_empty() => ContentCount {
            kind,
            count: cats.len(),
            method: CountMethod::CategoriesOnly,
            listing: outcome,
        },
        _ => {
            warn!(?kind, "no listing and no categories");
            ContentCount::unavailable(kind, outcome)
        }
    };

    ProbeOutput {
        count,
        items: Vec::new(),
    }
}

fn listed_item(entry: &Value, kind: ContentKind) -> ListedItem {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    let series_id = match kind {
        ContentKind::Series => entry
            .get("series_id")
            .map(FlexValue::from_json)
            .and_then(|id| id.to_text())
            .filter(|id| !id.trim().is_empty()),
        _ => None,
    };
    ListedItem { name, series_id }
}
