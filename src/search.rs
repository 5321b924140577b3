// src/search.rs
//! Catalog keyword search.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY: &str = "US";
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSummary {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub bundle_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    result_count: u64,
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    track_id: Option<u64>,
    track_name: Option<String>,
    track_view_url: Option<String>,
    bundle_id: Option<String>,
}

pub async fn search_apps(
    client: &reqwest::Client,
    base: &str,
    term: &str,
    country: &str,
    limit: u32,
) -> Result<Vec<AppSummary>> {
    let url = format!("{}/search", base.trim_end_matches('/'));
    let limit = limit.to_string();
    let resp: SearchResponse = client
        .get(&url)
        .query(&[
            ("term", term),
            ("country", country),
            ("entity", "software"),
            ("limit", limit.as_str()),
        ])
        .send()
        .await
        .context("catalog search request")?
        .error_for_status()
        .context("catalog search non-2xx")?
        .json()
        .await
        .context("catalog search json")?;

    if resp.result_count == 0 {
        tracing::info!(term, country, "no apps matched");
        return Ok(Vec::new());
    }

    Ok(resp
        .results
        .into_iter()
        .filter_map(|it| {
            Some(AppSummary {
                id: it.track_id?.to_string(),
                name: it.track_name.unwrap_or_default(),
                url: it.track_view_url,
                bundle_id: it.bundle_id,
            })
        })
        .collect())
}
