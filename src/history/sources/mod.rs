// src/history/sources/mod.rs
pub mod agzy;
pub mod apple_lookup;
pub mod bilin;
pub mod i4;
pub mod timbrd;

use std::sync::Arc;

use crate::config::SourceEndpoints;
use crate::history::types::HistorySource;

pub use agzy::AgzySource;
pub use apple_lookup::AppleLookupSource;
pub use bilin::BilinSource;
pub use i4::I4Source;
pub use timbrd::TimbrdSource;

/// All sources in merge priority order. History is concatenated in this order and
/// the first non-empty name / bundle id wins.
pub fn default_sources(
    client: &reqwest::Client,
    endpoints: &SourceEndpoints,
) -> Vec<Arc<dyn HistorySource>> {
    vec![
        Arc::new(I4Source::new(
            client.clone(),
            &endpoints.i4_search_url,
            &endpoints.i4_detail_url,
        )),
        Arc::new(BilinSource::new(client.clone(), &endpoints.bilin_url)),
        Arc::new(TimbrdSource::new(client.clone(), &endpoints.timbrd_url)),
        Arc::new(AgzySource::new(client.clone(), &endpoints.agzy_url)),
        Arc::new(AppleLookupSource::new(client.clone(), &endpoints.apple_lookup_url)),
    ]
}
