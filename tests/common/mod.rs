// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ipagrab::error::FetchError;
use ipagrab::{HistorySource, SourceResult, VersionRecord};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock upstream");
    });
    format!("http://{addr}")
}

pub fn client() -> reqwest::Client {
    ipagrab::http::build_client_with(Duration::from_secs(5), false).expect("client")
}

pub fn versions(items: &[(&str, &str)]) -> Vec<VersionRecord> {
    items.iter().map(|(v, id)| VersionRecord::new(*v, *id)).collect()
}

pub fn history(items: &[(&str, &str)]) -> SourceResult {
    SourceResult {
        history: versions(items),
        ..SourceResult::default()
    }
}

/// What a scripted source does when called.
pub enum Script {
    Answer(SourceResult),
    Malformed,
    Hang,
    Panic,
}

/// In-memory source with an optional delay and a call counter.
pub struct ScriptedSource {
    pub label: &'static str,
    pub delay: Duration,
    pub script: Script,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(label: &'static str, script: Script) -> Self {
        Self {
            label,
            delay: Duration::ZERO,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn answering(label: &'static str, res: SourceResult) -> Self {
        Self::new(label, Script::Answer(res))
    }

    pub fn delayed(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

#[async_trait]
impl HistorySource for ScriptedSource {
    async fn fetch(&self, _app_id: &str) -> Result<SourceResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.script {
            Script::Answer(r) => Ok(r.clone()),
            Script::Malformed => Err(FetchError::Malformed("scripted garbage".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(SourceResult::default())
            }
            Script::Panic => panic!("scripted panic in {}", self.label),
        }
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

pub fn arc(src: ScriptedSource) -> Arc<dyn HistorySource> {
    Arc::new(src)
}
