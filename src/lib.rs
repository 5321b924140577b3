// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod acquire;
pub mod config;
pub mod download;
pub mod error;
pub mod history;
pub mod http;
pub mod logging;
pub mod resolve;
pub mod retry;
pub mod search;
pub mod select;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::history::types::{AggregatedHistory, HistorySource, SourceResult, VersionRecord};
pub use crate::history::{Aggregator, HistoryQuery, QueryResult};
pub use crate::resolve::{resolve_app_id, ResolvedId};
