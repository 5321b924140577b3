// src/history/types.rs
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Name used when no source reports one.
pub const UNKNOWN_APP: &str = "Unknown App";

/// One installable build as known to a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VersionRecord {
    pub version: String,    // e.g. "7.0.12"
    pub version_id: String, // store external version id
}

impl VersionRecord {
    pub fn new(version: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            version_id: version_id.into(),
        }
    }
}

/// What one source knows about an app. Every part is optional; the default value
/// is the source's "nothing found" result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceResult {
    pub current: Option<VersionRecord>,
    pub history: Vec<VersionRecord>,
    pub name: Option<String>,
    pub bundle_id: Option<String>,
}

impl SourceResult {
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
            && self.history.is_empty()
            && self.name.is_none()
            && self.bundle_id.is_none()
    }
}

/// Reconciled view across all sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregatedHistory {
    pub app_id: String,
    /// First-seen order across sources; unique by (version, version_id).
    pub versions: Vec<VersionRecord>,
    pub name: String,
    pub bundle_id: Option<String>,
    pub current: Option<VersionRecord>,
}

#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch(&self, app_id: &str) -> Result<SourceResult, FetchError>;
    fn name(&self) -> &'static str;
}
