// src/http.rs
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::FetchError;

/// Mobile Safari UA; the catalog lookup answers it more reliably than a bare client.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

/// UA the store endpoints expect.
pub const CONFIGURATOR_USER_AGENT: &str =
    "Configurator/2.15 (Macintosh; OS X 11.0.0; 16G29) AppleWebKit/2603.3.8";

/// Build the one client shared by every source and store call.
pub fn build_client(cfg: &AppConfig) -> Result<reqwest::Client> {
    build_client_with(cfg.timeout(), cfg.accept_invalid_certs)
}

pub fn build_client_with(timeout: Duration, accept_invalid_certs: bool) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(4)).max(Duration::from_millis(500)))
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .context("building http client")
}

/// GET `url` and decode the body as JSON. Non-2xx statuses are errors.
pub async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value, FetchError> {
    get_json_with(client.get(url)).await
}

pub async fn get_json_with(req: reqwest::RequestBuilder) -> Result<Value, FetchError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
