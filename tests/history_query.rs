// tests/history_query.rs
mod common;

use axum::{extract::Query, routing::get, Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{arc, history, serve, ScriptedSource};
use ipagrab::config::{AppConfig, SourceEndpoints};
use ipagrab::history::report::ReportSink;
use ipagrab::{Aggregator, HistoryQuery};

#[tokio::test]
async fn unresolvable_input_issues_no_calls_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let src = ScriptedSource::answering("a", history(&[("1.0", "1")]));
    let calls = src.calls.clone();
    let q = HistoryQuery::new(
        Aggregator::new(vec![arc(src)], Duration::from_secs(1)),
        Some(ReportSink::new(tmp.path().join("history"))),
    );

    assert!(q.run("not-an-id").await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!tmp.path().join("history").exists());
}

#[tokio::test]
async fn url_input_is_echoed_in_report_bare_id_is_not() {
    let tmp = tempfile::tempdir().unwrap();
    let q = HistoryQuery::new(
        Aggregator::new(
            vec![arc(ScriptedSource::answering("a", history(&[("1.0", "1")])))],
            Duration::from_secs(1),
        ),
        Some(ReportSink::new(tmp.path())),
    );

    let url = "https://apps.apple.com/us/app/widget/id123456789";
    let res = q.run(url).await.unwrap();
    assert_eq!(res.resolved.id, "123456789");
    let path = res.report_path.unwrap();
    assert!(path.ends_with("123456789_Unknown App_history.txt"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains(&format!("Original input: {url}")));

    let res = q.run("123456789").await.unwrap();
    let text = std::fs::read_to_string(res.report_path.unwrap()).unwrap();
    assert!(!text.contains("Original input"));
    assert!(text.contains("[1] 1.0 -> 1"));
}

/// All five real adapters against one local mock upstream.
#[tokio::test]
async fn real_adapters_end_to_end() {
    let router = Router::new()
        .route(
            "/getAppList.xhtml",
            get(|| async {
                Json(json!({"app": [
                    {"itemid": 111, "id": 1, "name": "Other"},
                    {"itemid": "555", "id": 77, "name": "Listing Widget", "bundleid": "com.example.widget"}
                ]}))
            }),
        )
        .route(
            "/appinfo.xhtml",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("appid").map(String::as_str), Some("77"));
                Json(json!({
                    "Version": "3.0", "versionid": 3000,
                    "Name": "Widget",
                    "historyversion": [
                        {"Version": "2.0", "versionid": 2000},
                        {"Version": "1.0", "versionid": 1000}
                    ]
                }))
            }),
        )
        .route(
            "/history/{id}",
            get(|| async { Json(json!({"data": [{"bundle_version": "1.0", "external_identifier": 1000}, {"bundle_version": "0.9", "external_identifier": 900}]})) }),
        )
        .route(
            "/apple/app-version/index.php",
            get(|| async { "<html>maintenance</html>" }),
        )
        .route(
            "/searchVersion",
            get(|| async { Json(json!({"name": "Agzy Widget", "data": [{"version": "0.8", "versionId": "800"}]})) }),
        )
        .route(
            "/lookup",
            get(|| async { Json(json!({"resultCount": 1, "results": [{"trackName": "Official Widget", "bundleId": "com.example.official"}]})) }),
        );
    let base = serve(router).await;

    let tmp = tempfile::tempdir().unwrap();
    let cfg = AppConfig {
        history_dir: tmp.path().to_path_buf(),
        timeout_secs: 5,
        sources: SourceEndpoints {
            i4_search_url: base.clone(),
            i4_detail_url: base.clone(),
            bilin_url: base.clone(),
            timbrd_url: base.clone(),
            agzy_url: base.clone(),
            apple_lookup_url: base.clone(),
        },
        ..AppConfig::default()
    };
    let q = HistoryQuery::from_config(&cfg, &common::client());
    let res = q.run("555").await.unwrap();
    let h = res.history;

    let pairs: Vec<(&str, &str)> = h
        .versions
        .iter()
        .map(|v| (v.version.as_str(), v.version_id.as_str()))
        .collect();
    assert_eq!(
        pairs,
        [("2.0", "2000"), ("1.0", "1000"), ("0.9", "900"), ("0.8", "800")]
    );
    assert_eq!(h.name, "Widget");
    assert_eq!(h.bundle_id.as_deref(), Some("com.example.widget"));
    assert_eq!(h.current.as_ref().map(|c| c.version_id.as_str()), Some("3000"));

    let text = std::fs::read_to_string(res.report_path.unwrap()).unwrap();
    assert!(text.starts_with("App ID: 555 | Widget | bundleId: com.example.widget\n"));
    assert!(text.contains("Current version: 3.0 -> 3000\n"));
    assert!(text.contains("Found 4 historical versions:\n"));
}
