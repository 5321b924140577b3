// src/acquire.rs
//! Login → ownership check → purchase if needed → package download.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::download::download_package;
use crate::error::StoreError;
use crate::history::report::sanitize_name;
use crate::retry::RetryPolicy;
use crate::store::purchase::{purchase_with_region_fallback, PurchaseOutcome};
use crate::store::{AppStore, DownloadTicket, LoginInfo};

#[derive(Debug, Clone)]
pub struct AcquireRequest {
    pub app_id: String,
    /// External version id; latest when `None`.
    pub version_id: Option<String>,
    /// Used for the output file name when the store does not report one.
    pub bundle_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Acquired {
    pub path: PathBuf,
    pub bytes: u64,
    /// Set when this run bought the app.
    pub purchase: Option<PurchaseOutcome>,
}

pub struct Acquirer {
    store: Arc<dyn AppStore>,
    client: reqwest::Client,
    login_policy: RetryPolicy,
    purchase_policy: RetryPolicy,
    storefronts: Vec<String>,
    output_dir: PathBuf,
}

impl Acquirer {
    pub fn new(
        store: Arc<dyn AppStore>,
        client: reqwest::Client,
        login_policy: RetryPolicy,
        purchase_policy: RetryPolicy,
        storefronts: Vec<String>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            client,
            login_policy,
            purchase_policy,
            storefronts,
            output_dir,
        }
    }

    pub fn from_config(cfg: &AppConfig, client: reqwest::Client, store: Arc<dyn AppStore>) -> Self {
        Self::new(
            store,
            client,
            cfg.retry.login_policy(),
            cfg.retry.purchase_policy(),
            cfg.store.storefronts.clone(),
            cfg.output_dir.clone(),
        )
    }

    pub async fn login(&self, apple_id: &str, password: &str) -> Result<LoginInfo> {
        if apple_id.trim().is_empty() {
            return Err(anyhow!("no Apple ID configured"));
        }
        self.login_policy
            .run("login", |_| self.store.authenticate(apple_id, password))
            .await
            .map_err(|e| anyhow!("too many failed login attempts: {e}"))
    }

    async fn purchase(&self, app_id: &str, login: &LoginInfo) -> Result<PurchaseOutcome> {
        let outcome = self
            .purchase_policy
            .run("purchase", |_| {
                purchase_with_region_fallback(self.store.as_ref(), app_id, login, &self.storefronts)
            })
            .await;
        match outcome {
            Ok(o) => {
                tracing::info!(app_id, outcome = ?o, "purchase done");
                Ok(o)
            }
            Err(StoreError::RegionMismatch) => Err(anyhow!(
                "purchase failed: account region matches none of the configured storefronts"
            )),
            Err(e) => Err(anyhow!("purchase failed: {e}")),
        }
    }

    /// Where the package for `req` lands.
    pub fn package_path(&self, req: &AcquireRequest, ticket: &DownloadTicket) -> PathBuf {
        let stem = ticket
            .bundle_id
            .as_deref()
            .or(req.bundle_id.as_deref())
            .unwrap_or(&req.app_id);
        let version = ticket
            .version
            .as_deref()
            .or(req.version_id.as_deref())
            .unwrap_or("latest");
        self.output_dir
            .join(format!("{}_{}.ipa", sanitize_name(stem), sanitize_name(version)))
    }

    /// Full flow for an authenticated session.
    pub async fn acquire(&self, login: &LoginInfo, req: &AcquireRequest) -> Result<Acquired> {
        let version_id = req.version_id.as_deref();
        let (ticket, purchase) = match self
            .store
            .download_ticket(&req.app_id, version_id, login)
            .await
        {
            Ok(t) => {
                tracing::info!(app_id = %req.app_id, "already owned, downloading");
                (t, None)
            }
            Err(StoreError::NotOwned { message }) => {
                tracing::info!(app_id = %req.app_id, reason = %message, "not owned yet, purchasing");
                let outcome = self.purchase(&req.app_id, login).await?;
                let t = self
                    .store
                    .download_ticket(&req.app_id, version_id, login)
                    .await
                    .context("requesting download ticket after purchase")?;
                (t, Some(outcome))
            }
            Err(e) => return Err(e).context("requesting download ticket"),
        };

        let path = self.package_path(req, &ticket);
        let bytes = download_package(&self.client, &ticket, &path).await?;
        Ok(Acquired {
            path,
            bytes,
            purchase,
        })
    }
}
