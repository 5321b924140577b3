// src/store/mod.rs
pub mod plist;
pub mod purchase;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::StoreEndpoints;
use crate::error::StoreError;
use crate::http::CONFIGURATOR_USER_AGENT;
use plist::Value;
use purchase::{classify_purchase, purchase_body, PurchaseOutcome, RequestConfig};

/// Session returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub ds_person_id: String,
    pub password_token: String,
    /// Storefront the account belongs to, from `x-set-apple-store-front`.
    pub store_front: Option<String>,
    pub display_name: Option<String>,
}

/// Where and what to download for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub url: String,
    pub version: Option<String>,
    pub bundle_id: Option<String>,
}

#[async_trait]
pub trait AppStore: Send + Sync {
    /// `password` already carries any two-factor code.
    async fn authenticate(&self, apple_id: &str, password: &str) -> Result<LoginInfo, StoreError>;

    /// Ticket for `app_id` at `version_id` (latest when `None`).
    /// `StoreError::NotOwned` means the account needs to purchase first.
    async fn download_ticket(
        &self,
        app_id: &str,
        version_id: Option<&str>,
        login: &LoginInfo,
    ) -> Result<DownloadTicket, StoreError>;

    async fn purchase(
        &self,
        app_id: &str,
        login: &LoginInfo,
        cfg: &RequestConfig,
    ) -> Result<PurchaseOutcome, StoreError>;
}

/// The real store over HTTPS with plist bodies.
pub struct ItunesStore {
    client: reqwest::Client,
    endpoints: StoreEndpoints,
    guid: String,
}

impl ItunesStore {
    pub fn new(client: reqwest::Client, endpoints: StoreEndpoints) -> Self {
        let guid = if endpoints.guid.trim().is_empty() {
            purchase::random_hex(&mut rand::rng(), 12).to_ascii_uppercase()
        } else {
            endpoints.guid.trim().to_string()
        };
        Self {
            client,
            endpoints,
            guid,
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    async fn post_plist(
        &self,
        req: reqwest::RequestBuilder,
        body: String,
    ) -> Result<(Value, reqwest::header::HeaderMap), StoreError> {
        let resp = req
            .header(USER_AGENT, CONFIGURATOR_USER_AGENT)
            .body(body)
            .send()
            .await?;
        let headers = resp.headers().clone();
        let text = resp.text().await?;
        Ok((plist::from_xml(&text)?, headers))
    }
}

/// `customerMessage` if present, else `failureType`.
fn failure_message(resp: &Value) -> Option<String> {
    let failure = resp.text("failureType")?;
    Some(resp.text("customerMessage").unwrap_or(failure))
}

pub fn parse_login(resp: &Value, store_front: Option<String>) -> Result<LoginInfo, StoreError> {
    if let Some(message) = failure_message(resp) {
        return Err(StoreError::Auth { message });
    }
    let display_name = resp
        .get("accountInfo")
        .and_then(|a| a.get("address"))
        .and_then(|a| a.text("firstName"));
    Ok(LoginInfo {
        ds_person_id: resp
            .text("dsPersonId")
            .ok_or(StoreError::MissingField("dsPersonId"))?,
        password_token: resp
            .text("passwordToken")
            .ok_or(StoreError::MissingField("passwordToken"))?,
        store_front,
        display_name,
    })
}

pub fn parse_ticket(resp: &Value) -> Result<DownloadTicket, StoreError> {
    if let Some(message) = failure_message(resp) {
        return Err(StoreError::NotOwned { message });
    }
    let item = resp
        .get("songList")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .ok_or(StoreError::MissingField("songList"))?;
    let meta = item.get("metadata");
    Ok(DownloadTicket {
        url: item.text("URL").ok_or(StoreError::MissingField("URL"))?,
        version: meta.and_then(|m| m.text("bundleShortVersionString")),
        bundle_id: meta.and_then(|m| m.text("softwareVersionBundleId")),
    })
}

#[async_trait]
impl AppStore for ItunesStore {
    async fn authenticate(&self, apple_id: &str, password: &str) -> Result<LoginInfo, StoreError> {
        let body = plist::to_xml(&plist::dict([
            ("appleId", Value::from(apple_id)),
            ("attempt", Value::from(4i64)),
            ("createSession", Value::from("true")),
            ("guid", Value::from(self.guid.as_str())),
            ("password", Value::from(password)),
            ("rmp", Value::from(0i64)),
            ("why", Value::from("signIn")),
        ]));
        let req = self
            .client
            .post(&self.endpoints.auth_url)
            .query(&[("guid", self.guid.as_str())])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        let (resp, headers) = self.post_plist(req, body).await?;
        let store_front = headers
            .get("x-set-apple-store-front")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let login = parse_login(&resp, store_front)?;
        tracing::info!(ds_person_id = %login.ds_person_id, "login ok");
        Ok(login)
    }

    async fn download_ticket(
        &self,
        app_id: &str,
        version_id: Option<&str>,
        login: &LoginInfo,
    ) -> Result<DownloadTicket, StoreError> {
        let mut fields = vec![
            ("creditDisplay", ""),
            ("guid", self.guid.as_str()),
            ("salableAdamId", app_id),
        ];
        if let Some(v) = version_id.filter(|v| !v.is_empty()) {
            fields.push(("externalVersionId", v));
        }
        let body = plist::to_xml(&plist::dict(fields));
        let req = self
            .client
            .post(&self.endpoints.download_url)
            .query(&[("guid", self.guid.as_str())])
            .header(CONTENT_TYPE, "application/x-apple-plist")
            .header("X-Dsid", &login.ds_person_id)
            .header("iCloud-DSID", &login.ds_person_id);
        let (resp, _) = self.post_plist(req, body).await?;
        parse_ticket(&resp)
    }

    async fn purchase(
        &self,
        app_id: &str,
        login: &LoginInfo,
        cfg: &RequestConfig,
    ) -> Result<PurchaseOutcome, StoreError> {
        tracing::info!(app_id, storefront = %cfg.storefront, "purchasing");
        let req = self
            .client
            .post(&self.endpoints.purchase_url)
            .header(CONTENT_TYPE, "application/x-apple-plist")
            .header("accept", "*/*")
            .header("accept-language", &cfg.accept_language)
            .header("x-apple-store-front", &cfg.storefront)
            .header("x-token", &login.password_token)
            .header("x-dsid", &login.ds_person_id)
            .header("icloud-dsid", &login.ds_person_id)
            .header("cookie", purchase::build_cookies(login));
        let (resp, _) = self.post_plist(req, purchase_body(app_id, &self.guid)).await?;
        classify_purchase(&resp)
    }
}
