// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::retry::{Backoff, RetryPolicy};

pub const ENV_CONFIG_PATH: &str = "IPAGRAB_CONFIG";
pub const ENV_PASSWORD: &str = "IPAGRAB_PASSWORD";
pub const DEFAULT_CONFIG_PATH: &str = "config/ipagrab.toml";

fn default_history_dir() -> PathBuf {
    PathBuf::from("history")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("app")
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where `<appId>_<name>_history.txt` reports go.
    pub history_dir: PathBuf,
    /// Where downloaded packages go.
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    /// Skip TLS verification (useful behind an intercepting proxy).
    pub accept_invalid_certs: bool,
    pub credentials: Credentials,
    pub retry: RetryConfig,
    pub sources: SourceEndpoints,
    pub store: StoreEndpoints,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            output_dir: default_output_dir(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
            credentials: Credentials::default(),
            retry: RetryConfig::default(),
            sources: SourceEndpoints::default(),
            store: StoreEndpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub apple_id: String,
    /// "ENV" means: read from IPAGRAB_PASSWORD
    pub password: String,
    /// Two-factor code, appended to the password on login.
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub login_attempts: u32,
    pub purchase_attempts: u32,
    pub delay_ms: u64,
    /// "fixed" or "exponential"; applies to login retries.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            login_attempts: 3,
            purchase_attempts: 2,
            delay_ms: 2000,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryConfig {
    pub fn login_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.login_attempts,
            Duration::from_millis(self.delay_ms),
            self.backoff,
        )
    }

    pub fn purchase_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.purchase_attempts,
            Duration::from_millis(self.delay_ms),
            Backoff::Fixed,
        )
    }
}

/// Base URLs of the history mirrors and the catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub i4_search_url: String,
    pub i4_detail_url: String,
    pub bilin_url: String,
    pub timbrd_url: String,
    pub agzy_url: String,
    pub apple_lookup_url: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            i4_search_url: "https://search-app-m.i4.cn".into(),
            i4_detail_url: "https://app4.i4.cn".into(),
            bilin_url: "https://apis.bilin.eu.org".into(),
            timbrd_url: "https://api.timbrd.com".into(),
            agzy_url: "https://app.agzy.cn".into(),
            apple_lookup_url: "https://itunes.apple.com".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreEndpoints {
    pub auth_url: String,
    pub download_url: String,
    pub purchase_url: String,
    pub search_url: String,
    /// Device guid sent with store requests; random when empty.
    pub guid: String,
    /// Storefront ids tried in order when the account region does not match.
    pub storefronts: Vec<String>,
}

impl Default for StoreEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://p25-buy.itunes.apple.com/WebObjects/MZFinance.woa/wa/authenticate"
                .into(),
            download_url:
                "https://p25-buy.itunes.apple.com/WebObjects/MZFinance.woa/wa/volumeStoreDownloadProduct"
                    .into(),
            purchase_url: "https://buy.itunes.apple.com/WebObjects/MZFinance.woa/wa/buyProduct"
                .into(),
            search_url: "https://itunes.apple.com".into(),
            guid: String::new(),
            storefronts: crate::store::purchase::DEFAULT_STOREFRONTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load config using env var + fallbacks:
    /// 1) $IPAGRAB_CONFIG
    /// 2) config/ipagrab.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Password with the "ENV" indirection resolved and the 2FA code appended.
    pub fn resolved_password(&self) -> Result<String> {
        let base = if self.credentials.password.trim().eq_ignore_ascii_case("env") {
            env::var(ENV_PASSWORD).map_err(|_| anyhow!("Missing {ENV_PASSWORD} env var"))?
        } else {
            self.credentials.password.clone()
        };
        Ok(format!("{}{}", base, self.credentials.code.trim()))
    }

    fn sanitize(&mut self) {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.retry.login_attempts = self.retry.login_attempts.max(1);
        self.retry.purchase_attempts = self.retry.purchase_attempts.max(1);
        self.store.storefronts.retain(|s| !s.trim().is_empty());
        if self.store.storefronts.is_empty() {
            self.store.storefronts = StoreEndpoints::default().storefronts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            timeout_secs = 3
            [sources]
            bilin_url = "http://127.0.0.1:9"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.sources.bilin_url, "http://127.0.0.1:9");
        assert_eq!(cfg.sources.timbrd_url, "https://api.timbrd.com");
        assert_eq!(cfg.retry.login_attempts, 3);
        assert_eq!(cfg.history_dir, PathBuf::from("history"));
    }

    #[test]
    fn sanitize_fixes_zero_values() {
        let mut cfg: AppConfig = toml::from_str(
            r#"
            timeout_secs = 0
            [retry]
            login_attempts = 0
            [store]
            storefronts = [" "]
            "#,
        )
        .unwrap();
        cfg.sanitize();
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.retry.login_attempts, 1);
        assert_eq!(cfg.store.storefronts.len(), 5);
    }

    #[test]
    fn code_is_appended_to_plain_password() {
        let mut cfg = AppConfig::default();
        cfg.credentials.password = "hunter2".into();
        cfg.credentials.code = " 123456 ".into();
        assert_eq!(cfg.resolved_password().unwrap(), "hunter2123456");
    }
}
