// src/history/sources/bilin.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::history::normalize::{classify_list, kind, normalize_array, Payload};
use crate::history::types::{HistorySource, SourceResult};
use crate::http::get_json;

/// Mirror B: history by id, wrapped in `{ "data": [...] }`.
pub struct BilinSource {
    client: reqwest::Client,
    base: String,
}

impl BilinSource {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn parse(body: &Value) -> Result<SourceResult, FetchError> {
        if !body.is_object() {
            return Err(FetchError::Malformed(format!("body is {}", kind(body))));
        }
        match classify_list(body.get("data")) {
            Payload::Valid(items) => Ok(SourceResult {
                history: normalize_array(items),
                ..SourceResult::default()
            }),
            Payload::Empty => Ok(SourceResult::default()),
            Payload::Malformed(m) => Err(FetchError::Malformed(format!("data: {m}"))),
        }
    }
}

#[async_trait]
impl HistorySource for BilinSource {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError> {
        let url = format!("{}/history/{}", self.base, app_id);
        let body = get_json(&self.client, &url).await?;
        Self::parse(&body)
    }

    fn name(&self) -> &'static str {
        "bilin"
    }
}
