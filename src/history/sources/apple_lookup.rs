// src/history/sources/apple_lookup.rs
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;

use crate::error::FetchError;
use crate::history::normalize::{kind, text_field};
use crate::history::types::{HistorySource, SourceResult};
use crate::http::{get_json_with, MOBILE_USER_AGENT};

/// Official catalog lookup. Name and bundle id only, never history.
pub struct AppleLookupSource {
    client: reqwest::Client,
    base: String,
}

impl AppleLookupSource {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn parse(body: &Value) -> Result<SourceResult, FetchError> {
        let Some(obj) = body.as_object() else {
            return Err(FetchError::Malformed(format!("body is {}", kind(body))));
        };
        let count = obj.get("resultCount").and_then(Value::as_u64).unwrap_or(0);
        let first = obj
            .get("results")
            .and_then(Value::as_array)
            .and_then(|r| r.first());
        match (count, first) {
            (0, _) | (_, None) => Ok(SourceResult::default()),
            (_, Some(app)) => Ok(SourceResult {
                name: text_field(app, "trackName"),
                bundle_id: text_field(app, "bundleId"),
                ..SourceResult::default()
            }),
        }
    }
}

#[async_trait]
impl HistorySource for AppleLookupSource {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError> {
        let req = self
            .client
            .get(format!("{}/lookup", self.base))
            .query(&[("id", app_id)])
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(ACCEPT, "application/json, text/plain, */*");
        let body = get_json_with(req).await?;
        Self::parse(&body)
    }

    fn name(&self) -> &'static str {
        "apple"
    }
}
