// src/store/purchase.rs
//! Free-app purchase: request building, response classification, region fallback.

use rand::Rng;

use super::plist::{self, Value};
use super::{AppStore, LoginInfo};
use crate::error::StoreError;

/// Storefront used when the login did not report one.
pub const DEFAULT_STOREFRONT: &str = "143441-1,32";

/// Tried in order when the account region does not match the store.
pub const DEFAULT_STOREFRONTS: [&str; 5] = [
    "143465-1,32",
    "143441-1,32",
    "143463-1,32",
    "143462-1,32",
    "143470-1,32",
];

const REGION_MISMATCH_MARKERS: [&str; 2] = ["Account Not In This Store", "region mismatch"];

/// Per-attempt request settings. Built fresh for every attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub storefront: String,
    pub accept_language: String,
}

impl RequestConfig {
    pub fn new(storefront: impl Into<String>) -> Self {
        Self {
            storefront: storefront.into(),
            accept_language: "zh-CN,zh-Hans;q=0.9".to_string(),
        }
    }

    /// Storefront from the login session, or the default.
    pub fn for_login(login: &LoginInfo) -> Self {
        Self::new(
            login
                .store_front
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STOREFRONT.to_string()),
        )
    }

    pub fn with_storefront(&self, storefront: &str) -> Self {
        Self {
            storefront: storefront.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// New license; `items` is the song list length.
    Purchased { items: usize },
    AlreadyOwned,
    /// Store accepted the request without details.
    Completed,
}

/// The plist body for a zero-price purchase of `app_id`.
pub fn purchase_body(app_id: &str, guid: &str) -> String {
    let orig_page = format!("Software-{app_id}");
    plist::to_xml(&plist::dict([
        ("appExtVrsId", "0"),
        ("buyWithoutAuthorization", "true"),
        ("guid", guid),
        ("hasAskedToFulfillPreorder", "true"),
        ("hasDoneAgeCheck", "true"),
        ("needDiv", "0"),
        ("origPage", orig_page.as_str()),
        ("origPageLocation", "Buy"),
        ("price", "0"),
        ("pricingParameters", "STDQ"),
        ("productType", "C"),
        ("salableAdamId", app_id),
    ]))
}

/// Classify a parsed buyProduct response.
pub fn classify_purchase(resp: &Value) -> Result<PurchaseOutcome, StoreError> {
    if let Some(failure) = resp.text("failureType") {
        let message = resp.text("customerMessage").unwrap_or(failure);
        if is_region_mismatch(&message) {
            return Err(StoreError::RegionMismatch);
        }
        return Err(StoreError::Purchase { message });
    }
    if let Some(songs) = resp.get("songList").and_then(Value::as_array) {
        if !songs.is_empty() {
            return Ok(PurchaseOutcome::Purchased { items: songs.len() });
        }
    }
    if resp.get("downloadKey").is_some() {
        return Ok(PurchaseOutcome::AlreadyOwned);
    }
    Ok(PurchaseOutcome::Completed)
}

pub fn is_region_mismatch(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    REGION_MISMATCH_MARKERS
        .iter()
        .any(|m| lower.contains(&m.to_ascii_lowercase()))
}

/// Session cookies the purchase endpoint expects alongside the token headers.
pub fn build_cookies(login: &LoginInfo) -> String {
    let mut rng = rand::rng();
    let session_id = random_token(&mut rng, 26);
    let ds = &login.ds_person_id;
    let tok = &login.password_token;
    [
        "hsaccnt=1".to_string(),
        format!("mzf_in={}", rng.random_range(0..100_000)),
        format!("session-store-id={session_id}"),
        format!("X-Dsid={ds}"),
        "itspod=2".to_string(),
        format!("mz_at0_fr={tok}"),
        format!("mz_at0_fr-{ds}={tok}"),
        format!("mz_at_ssl-{ds}=AwUAAAIBAABOIAAAAAB{}", random_token(&mut rng, 28)),
        format!("pldfltcid={}", random_hex(&mut rng, 32)),
        format!("wosid-lite={}", &session_id[..20]),
        format!("dsid={ds}"),
    ]
    .join("; ")
}

fn random_token(rng: &mut impl Rng, len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

pub(crate) fn random_hex(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('0'))
        .collect()
}

/// Purchase with the login's storefront, then walk `storefronts` while the store keeps
/// reporting a region mismatch. Any other outcome ends the walk.
pub async fn purchase_with_region_fallback(
    store: &dyn AppStore,
    app_id: &str,
    login: &LoginInfo,
    storefronts: &[String],
) -> Result<PurchaseOutcome, StoreError> {
    let base = RequestConfig::for_login(login);
    match store.purchase(app_id, login, &base).await {
        Err(StoreError::RegionMismatch) => {}
        other => return other,
    }

    for sf in storefronts.iter().filter(|sf| **sf != base.storefront) {
        tracing::info!(storefront = %sf, app_id, "region mismatch, retrying with another storefront");
        let cfg = base.with_storefront(sf);
        match store.purchase(app_id, login, &cfg).await {
            Err(StoreError::RegionMismatch) => continue,
            other => return other,
        }
    }
    Err(StoreError::RegionMismatch)
}
