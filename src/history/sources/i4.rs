// src/history/sources/i4.rs
//! Mirror A: listing search for the internal id, then a detail fetch.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::history::normalize::{classify_list, kind, normalize_array, normalize_entry, text_field, Payload};
use crate::history::types::{HistorySource, SourceResult};
use crate::http::get_json;

pub struct I4Source {
    client: reqwest::Client,
    search_base: String,
    detail_base: String,
}

impl I4Source {
    pub fn new(client: reqwest::Client, search_base: &str, detail_base: &str) -> Self {
        Self {
            client,
            search_base: search_base.trim_end_matches('/').to_string(),
            detail_base: detail_base.trim_end_matches('/').to_string(),
        }
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/getAppList.xhtml?keyword=&model=iPhone&osversion=14.3&toolversion=100&pagesize=100&pageno=1",
            self.search_base
        )
    }

    fn detail_url(&self, internal_id: &str) -> String {
        format!("{}/appinfo.xhtml?appid={}&from=1", self.detail_base, internal_id)
    }

    /// Step 1: find the listing entry whose `itemid` is the store id.
    pub fn find_listing_entry<'a>(listing: &'a Value, app_id: &str) -> Payload<&'a Value> {
        let Value::Object(obj) = listing else {
            return Payload::Malformed(format!("listing is {}", kind(listing)));
        };
        let apps = match classify_list(obj.get("app")) {
            Payload::Valid(apps) => apps,
            Payload::Empty => return Payload::Empty,
            Payload::Malformed(m) => return Payload::Malformed(format!("listing.app: {m}")),
        };
        apps.iter()
            .find(|a| text_field(a, "itemid").as_deref() == Some(app_id))
            .map_or(Payload::Empty, Payload::Valid)
    }

    /// Step 2: turn the detail payload into a result, falling back to the
    /// listing entry for name and bundle id.
    pub fn parse_detail(detail: &Value, entry: &Value) -> Result<SourceResult, FetchError> {
        if !detail.is_object() {
            return Err(FetchError::Malformed(format!("detail is {}", kind(detail))));
        }
        let history = match classify_list(detail.get("historyversion")) {
            Payload::Valid(items) => normalize_array(items),
            Payload::Empty => Vec::new(),
            Payload::Malformed(m) => {
                return Err(FetchError::Malformed(format!("historyversion: {m}")))
            }
        };
        Ok(SourceResult {
            current: normalize_entry(detail),
            history,
            name: text_field(detail, "Name").or_else(|| text_field(entry, "name")),
            bundle_id: text_field(detail, "bundleid").or_else(|| text_field(entry, "bundleid")),
        })
    }
}

#[async_trait]
impl HistorySource for I4Source {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError> {
        let listing = get_json(&self.client, &self.listing_url()).await?;
        let entry = match Self::find_listing_entry(&listing, app_id) {
            Payload::Valid(entry) => entry,
            Payload::Empty => {
                tracing::debug!(source = "i4", app_id, "no listing match, skipping detail");
                return Ok(SourceResult::default());
            }
            Payload::Malformed(m) => return Err(FetchError::Malformed(m)),
        };
        let internal_id = text_field(entry, "id")
            .ok_or_else(|| FetchError::Malformed("listing entry without id".into()))?;

        let detail = get_json(&self.client, &self.detail_url(&internal_id)).await?;
        Self::parse_detail(&detail, entry)
    }

    fn name(&self) -> &'static str {
        "i4"
    }
}
