// tests/history_sources.rs
mod common;

use axum::{extract::Path, extract::Query, http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{client, serve, versions};
use ipagrab::error::FetchError;
use ipagrab::history::sources::{AgzySource, AppleLookupSource, BilinSource, I4Source, TimbrdSource};
use ipagrab::HistorySource;

#[tokio::test]
async fn i4_two_step_lookup() {
    let router = Router::new()
        .route(
            "/getAppList.xhtml",
            get(|| async { Json(json!({"app": [{"itemid": "123", "id": 9, "name": "Listed", "bundleid": "com.listed"}]})) }),
        )
        .route(
            "/appinfo.xhtml",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("appid").map(String::as_str), Some("9"));
                Json(json!({
                    "Version": "2.0", "versionid": "20",
                    "historyversion": [{"Version": "1.0", "versionid": 10}]
                }))
            }),
        );
    let base = serve(router).await;

    let res = I4Source::new(client(), &base, &base).fetch("123").await.unwrap();
    assert_eq!(res.history, versions(&[("1.0", "10")]));
    assert_eq!(res.current.unwrap().version_id, "20");
    assert_eq!(res.name.as_deref(), Some("Listed"));
    assert_eq!(res.bundle_id.as_deref(), Some("com.listed"));
}

#[tokio::test]
async fn i4_without_listing_match_skips_detail() {
    let detail_hits = Arc::new(AtomicUsize::new(0));
    let hits = detail_hits.clone();
    let router = Router::new()
        .route(
            "/getAppList.xhtml",
            get(|| async { Json(json!({"app": [{"itemid": "999", "id": 1}]})) }),
        )
        .route(
            "/appinfo.xhtml",
            get(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({})) }
            }),
        );
    let base = serve(router).await;

    let res = I4Source::new(client(), &base, &base).fetch("123").await.unwrap();
    assert!(res.is_empty());
    assert_eq!(detail_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bilin_reads_data_list() {
    let router = Router::new().route(
        "/history/{id}",
        get(|Path(id): Path<String>| async move {
            assert_eq!(id, "123");
            Json(json!({"data": [
                {"bundle_version": "1.1", "external_identifier": 11},
                {"bundle_version": "", "external_identifier": 12}
            ]}))
        }),
    );
    let base = serve(router).await;

    let res = BilinSource::new(client(), &base).fetch("123").await.unwrap();
    assert_eq!(res.history, versions(&[("1.1", "11")]));
    assert!(res.name.is_none());
}

#[tokio::test]
async fn bilin_server_error_is_an_error() {
    let router = Router::new().route(
        "/history/{id}",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(router).await;

    let err = BilinSource::new(client(), &base).fetch("1").await.unwrap_err();
    assert!(matches!(err, FetchError::Status(500)), "got {err:?}");
}

#[tokio::test]
async fn timbrd_bare_array_and_object_body() {
    let router = Router::new().route(
        "/apple/app-version/index.php",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            if q.get("id").map(String::as_str) == Some("1") {
                Json(json!([{"bundle_version": "3.1", "external_identifier": "31"}]))
            } else {
                Json(json!({"error": "unknown app"}))
            }
        }),
    );
    let base = serve(router).await;
    let src = TimbrdSource::new(client(), &base);

    let res = src.fetch("1").await.unwrap();
    assert_eq!(res.history, versions(&[("3.1", "31")]));

    let err = src.fetch("2").await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn agzy_name_bundle_and_versions() {
    let router = Router::new().route(
        "/searchVersion",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            assert_eq!(q.get("appid").map(String::as_str), Some("7"));
            Json(json!({
                "name": "Widget Pro", "bundleId": "com.example.widgetpro",
                "data": [{"version": "5.0", "versionId": "50"}, {"Version": "4.0", "versionid": 40}]
            }))
        }),
    );
    let base = serve(router).await;

    let res = AgzySource::new(client(), &base).fetch("7").await.unwrap();
    assert_eq!(res.history, versions(&[("5.0", "50"), ("4.0", "40")]));
    assert_eq!(res.name.as_deref(), Some("Widget Pro"));
    assert_eq!(res.bundle_id.as_deref(), Some("com.example.widgetpro"));
}

#[tokio::test]
async fn apple_lookup_name_only() {
    let router = Router::new().route(
        "/lookup",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            if q.get("id").map(String::as_str) == Some("1") {
                Json(json!({"resultCount": 1, "results": [{"trackName": "Widget", "bundleId": "com.example.widget"}]}))
            } else {
                Json(json!({"resultCount": 0, "results": []}))
            }
        }),
    );
    let base = serve(router).await;
    let src = AppleLookupSource::new(client(), &base);

    let res = src.fetch("1").await.unwrap();
    assert!(res.history.is_empty());
    assert_eq!(res.name.as_deref(), Some("Widget"));
    assert_eq!(res.bundle_id.as_deref(), Some("com.example.widget"));

    assert!(src.fetch("2").await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_an_http_error() {
    // Nothing listens on the discard port.
    let err = BilinSource::new(client(), "http://127.0.0.1:9")
        .fetch("1")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(_)), "got {err:?}");
}
