// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tower::ServiceExt;

use ai_news_feed::api::{create_router, AppState};
use ai_news_feed::config::FeedConfig;
use ai_news_feed::ingest::{parse_document, FallbackLoader};
use ai_news_feed::metrics::Metrics;

async fn get_text(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::install().expect("recorder installs once");
    // a second install reuses the same handle
    assert!(Metrics::install().is_ok());

    let state = AppState::new(FeedConfig::default(), FallbackLoader::new(Vec::new(), true));
    state.bootstrap().await.unwrap();
    let app = create_router(state, Some(&metrics));

    let (status, _) = get_text(app.clone(), "/news?q=ai").await;
    assert_eq!(status, StatusCode::OK);

    let (status, text) = get_text(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "feed_load_total",
        "feed_items_loaded",
        "feed_pipeline_runs_total",
        "feed_pipeline_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

#[test]
fn malformed_records_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let parsed = metrics::with_local_recorder(&recorder, || {
        parse_document(r#"[{"title": "ok"}, 1, "two", {"title": "also ok"}]"#)
    })
    .unwrap();
    assert_eq!(parsed.len(), 2);

    let skipped = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find(|(key, _, _, _)| key.key().name() == "feed_malformed_items_total")
        .map(|(_, _, _, value)| value);
    assert_eq!(skipped, Some(DebugValue::Counter(2)));
}
