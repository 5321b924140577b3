// src/history/sources/timbrd.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::history::normalize::{classify_list, normalize_array, Payload};
use crate::history::types::{HistorySource, SourceResult};
use crate::http::get_json_with;

/// Mirror C: answers with a bare JSON array.
pub struct TimbrdSource {
    client: reqwest::Client,
    base: String,
}

impl TimbrdSource {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn parse(body: &Value) -> Result<SourceResult, FetchError> {
        match classify_list(Some(body)) {
            Payload::Valid(items) => Ok(SourceResult {
                history: normalize_array(items),
                ..SourceResult::default()
            }),
            Payload::Empty => Ok(SourceResult::default()),
            Payload::Malformed(m) => Err(FetchError::Malformed(m)),
        }
    }
}

#[async_trait]
impl HistorySource for TimbrdSource {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError> {
        let req = self
            .client
            .get(format!("{}/apple/app-version/index.php", self.base))
            .query(&[("id", app_id)]);
        let body = get_json_with(req).await?;
        Self::parse(&body)
    }

    fn name(&self) -> &'static str {
        "timbrd"
    }
}
