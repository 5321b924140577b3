// src/history/sources/agzy.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::history::normalize::{classify_list, kind, normalize_array, text_field, Payload};
use crate::history::types::{HistorySource, SourceResult};
use crate::http::get_json_with;

/// Mirror D: history plus display name and bundle id.
pub struct AgzySource {
    client: reqwest::Client,
    base: String,
}

impl AgzySource {
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
        // Identity is only trusted when the mirror knows the app (a `data` list, even empty).
        let history = match (body.get("data"), classify_list(body.get("data"))) {
            (_, Payload::Valid(items)) => normalize_array(items),
            (Some(Value::Array(_)), Payload::Empty) => Vec::new(),
            (_, Payload::Empty) => return Ok(SourceResult::default()),
            (_, Payload::Malformed(m)) => {
                return Err(FetchError::Malformed(format!("data: {m}")))
            }
        };
        Ok(SourceResult {
            current: None,
            history,
            name: text_field(body, "name"),
            bundle_id: text_field(body, "bundleId"),
        })
    }
}

#[async_trait]
impl HistorySource for AgzySource {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError> {
        let req = self
            .client
            .get(format!("{}/searchVersion", self.base))
            .query(&[("appid", app_id)]);
        let body = get_json_with(req).await?;
        Self::parse(&body)
    }

    fn name(&self) -> &'static str {
        "agzy"
    }
}
