//! Ingest the bundled NSW fixture into a file-backed store, then query it
//! through the resolver and the HTTP router.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use forecast::api::{self, ApiState};
use forecast::identity::IdentityKey;
use forecast::pipeline::{FixedClock, IngestionOrchestrator};
use forecast::services::QueryResolver;
use forecast::storage::{ForecastStore, LocalStore};
use forecast::transport::FileFeedSource;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "i-scream-you-scream";

fn feeds_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/feeds")
}

fn nsw_only() -> BTreeMap<String, String> {
    BTreeMap::from([("nsw".to_string(), "/anon/gen/fwo/IDN11060.xml".to_string())])
}

fn may_31() -> Arc<FixedClock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2023, 5, 31).unwrap()))
}

#[tokio::test]
async fn ingest_then_query() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(tmp.path().join("forecasts.json")));

    let report = IngestionOrchestrator::new(
        Arc::new(FileFeedSource::new(feeds_dir())),
        store.clone(),
        IdentityKey::new(SECRET).unwrap(),
        may_31(),
    )
    .run(&nsw_only())
    .await;

    assert!(report.failed_states().is_empty());
    assert_eq!(report.written(), 2);

    // Stored under the HMAC of "Sydney-2023-06-01-nsw"
    let stored = store.scan_by_secondary_id("2023-06-01-sydney").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "Odsyb7+VgW8ZofET+BVUUg8RRUUIJP4uIv4KExfaJ70=");

    let resolver = QueryResolver::new(store.clone(), may_31());
    let record = resolver.resolve("Sydney, nsw", Some("20230601")).await.unwrap();
    assert_eq!(record.min_temp.as_deref(), Some("10"));
    assert_eq!(record.max_temp.as_deref(), Some("20"));
    assert_eq!(record.precis.as_deref(), Some("Sunny"));
    assert_eq!(record.precipitation_probability.as_deref(), Some("20"));

    let app = api::app(ApiState::new(resolver));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather/Sydney?date=20230602")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["date"], "2023-06-02");
    assert_eq!(json["minTemp"], "11");
    assert_eq!(json["precis"], "Shower or two & wind.");
    assert!(json.get("maxTemp").is_none());
}

#[tokio::test]
async fn today_is_not_written() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(tmp.path().join("forecasts.json")));

    // Running on June 1st: only June 2nd is inside the window
    IngestionOrchestrator::new(
        Arc::new(FileFeedSource::new(feeds_dir())),
        store.clone(),
        IdentityKey::new(SECRET).unwrap(),
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap())),
    )
    .run(&nsw_only())
    .await;

    let resolver = QueryResolver::new(store, may_31());
    assert!(resolver.resolve("Sydney", Some("20230601")).await.is_err());
    assert!(resolver.resolve("Sydney", Some("20230602")).await.is_ok());
}
