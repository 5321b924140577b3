// src/history/mod.rs
pub mod normalize;
pub mod report;
pub mod sources;
pub mod types;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::resolve::{resolve_app_id, ResolvedId};
use report::ReportSink;
use types::{AggregatedHistory, HistorySource, SourceResult, UNKNOWN_APP};

/// One-time metrics registration (so series show up once a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("history_queries_total", "History queries that reached the sources.");
        describe_counter!(
            "history_versions_total",
            "Unique versions returned after merge + dedup."
        );
        describe_counter!(
            "history_source_errors_total",
            "Source fetch/parse errors, timeouts and panics."
        );
        describe_histogram!("history_source_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Fans one app id out to every source and reconciles the answers.
pub struct Aggregator {
    sources: Vec<Arc<dyn HistorySource>>,
    per_source_timeout: Duration,
}

impl Aggregator {
    /// `sources` order is the merge priority order.
    pub fn new(sources: Vec<Arc<dyn HistorySource>>, per_source_timeout: Duration) -> Self {
        Self {
            sources,
            per_source_timeout,
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run every source concurrently and wait for all of them. The returned vector
    /// is in registration order; failed sources contribute their empty result.
    pub async fn collect(&self, app_id: &str) -> Vec<SourceResult> {
        ensure_metrics_described();

        let mut set = JoinSet::new();
        for (idx, src) in self.sources.iter().enumerate() {
            let src = Arc::clone(src);
            let app_id = app_id.to_string();
            let limit = self.per_source_timeout;
            set.spawn(async move {
                let t0 = Instant::now();
                let out = match tokio::time::timeout(limit, src.fetch(&app_id)).await {
                    Ok(res) => res,
                    Err(_) => Err(FetchError::Timeout(limit)),
                };
                let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                histogram!("history_source_ms", "source" => src.name()).record(ms);
                (idx, out)
            });
        }

        let mut slots = vec![SourceResult::default(); self.sources.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(res))) => {
                    tracing::debug!(
                        source = self.sources[idx].name(),
                        versions = res.history.len(),
                        "source answered"
                    );
                    slots[idx] = res;
                }
                Ok((idx, Err(e))) => {
                    let name = self.sources[idx].name();
                    tracing::warn!(source = name, app_id, error = %e, "source failed, using empty result");
                    counter!("history_source_errors_total", "source" => name).increment(1);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, app_id, "source task aborted, using empty result");
                    counter!("history_source_errors_total", "source" => "task").increment(1);
                }
            }
        }
        slots
    }

    pub async fn aggregate(&self, app_id: &str) -> AggregatedHistory {
        let results = self.collect(app_id).await;
        let merged = merge(app_id, results);
        counter!("history_queries_total").increment(1);
        counter!("history_versions_total").increment(merged.versions.len() as u64);
        merged
    }
}

/// Merge per-source results given in priority order.
///
/// Versions are concatenated and deduplicated by `(version, version_id)`, keeping the
/// first occurrence. Name, bundle id and current pointer come from the first source
/// that has one.
pub fn merge(app_id: &str, results: Vec<SourceResult>) -> AggregatedHistory {
    let mut seen = HashSet::new();
    let mut versions = Vec::new();
    let mut name: Option<String> = None;
    let mut bundle_id: Option<String> = None;
    let mut current = None;

    for res in results {
        for v in res.history {
            if v.version.is_empty() || v.version_id.is_empty() {
                continue;
            }
            if seen.insert(v.clone()) {
                versions.push(v);
            }
        }
        name = name.or(res.name.filter(|n| !n.trim().is_empty()));
        bundle_id = bundle_id.or(res.bundle_id.filter(|b| !b.trim().is_empty()));
        current = current.or(res.current);
    }

    AggregatedHistory {
        app_id: app_id.to_string(),
        versions,
        name: name.unwrap_or_else(|| UNKNOWN_APP.to_string()),
        bundle_id,
        current,
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub resolved: ResolvedId,
    pub history: AggregatedHistory,
    /// None when no sink is configured or the write failed.
    pub report_path: Option<PathBuf>,
}

/// Resolver + aggregator + report sink.
pub struct HistoryQuery {
    aggregator: Aggregator,
    sink: Option<ReportSink>,
}

impl HistoryQuery {
    pub fn new(aggregator: Aggregator, sink: Option<ReportSink>) -> Self {
        Self { aggregator, sink }
    }

    /// Production wiring: every default source plus a report sink under `history_dir`.
    pub fn from_config(cfg: &AppConfig, client: &reqwest::Client) -> Self {
        let sources = sources::default_sources(client, &cfg.sources);
        Self::new(
            Aggregator::new(sources, cfg.timeout()),
            Some(ReportSink::new(&cfg.history_dir)),
        )
    }

    /// `None` when the input holds no app id; nothing is fetched in that case.
    pub async fn run(&self, input: &str) -> Option<QueryResult> {
        let Some(resolved) = resolve_app_id(input) else {
            tracing::info!(input, "input is neither an app id nor a storefront URL");
            return None;
        };

        tracing::info!(
            app_id = %resolved.id,
            sources = ?self.aggregator.source_names(),
            "querying version history"
        );
        let history = self.aggregator.aggregate(&resolved.id).await;

        let report_path = self.sink.as_ref().and_then(|sink| {
            let raw = resolved.from_url.then_some(input.trim());
            match sink.write(&history, raw) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = ?e, app_id = %history.app_id, "writing history report failed");
                    None
                }
            }
        });

        Some(QueryResult {
            resolved,
            history,
            report_path,
        })
    }
}
