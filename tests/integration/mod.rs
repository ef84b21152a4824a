//! Integration tests for the citybikes gateway.
//!
//! Most tests drive the full router against the in-memory store. The tests
//! marked `#[ignore]` talk to a real table and need AWS credentials (or a
//! local DynamoDB via DYNAMODB_ENDPOINT).
//! Run them with: cargo test --test integration -- --ignored

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use citybikes_gateway::api::{create_router, AppState};
use citybikes_gateway::config::Config;
use citybikes_gateway::dataset::{DatasetRecord, ExtraInfo, StationSnapshot, TableStatusSummary};
use citybikes_gateway::store::{DynamoStore, MockStore, MockStoreConfig, RecordStore, StoreCall};
use citybikes_gateway::telemetry::{AccessLogger, MemorySink};

const BAD_SEARCH_BODY: &str = r#""Search should be formatted with search?date=yyyy-mm-dd""#;

fn station(id: &str, free_bikes: i64) -> StationSnapshot {
    StationSnapshot {
        empty_slots: 10 - free_bikes,
        free_bikes,
        name: format!("Station {id}"),
        extra: ExtraInfo {
            renting: 1,
            returning: 1,
        },
        id: id.to_string(),
    }
}

fn record(time: &str, id: &str) -> DatasetRecord {
    DatasetRecord {
        timestamp: time.to_string(),
        id: id.to_string(),
        stations: vec![station("a1", 3), station("b2", 0)],
    }
}

fn seeded_store() -> MockStore {
    let store = MockStore::new();
    store.insert([
        record("2023-04-01T08:00:00Z", "r1"),
        record("2023-04-01T20:00:00Z", "r2"),
        record("2023-04-02T08:00:00Z", "r3"),
    ]);
    store
}

fn router_with(store: MockStore, config: &Config, sink: MemorySink) -> Router {
    let (access_log, _worker) =
        AccessLogger::spawn(config.log_tag.as_str(), 256, Some(Arc::new(sink)));
    let state = AppState::new(Arc::new(store), access_log, config);
    create_router(state, config)
}

fn router(store: MockStore) -> Router {
    router_with(store, &Config::default(), MemorySink::new())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn all_returns_every_record_in_store_order() {
    let (status, body) = get(router(seeded_store()), "/akc/all").await;
    assert_eq!(status, StatusCode::OK);

    let records: Vec<DatasetRecord> = serde_json::from_str(&body).unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
    assert_eq!(records[0], record("2023-04-01T08:00:00Z", "r1"));
}

#[tokio::test]
async fn search_returns_only_matching_day() {
    let (status, body) = get(router(seeded_store()), "/akc/search?date=2023-04-01").await;
    assert_eq!(status, StatusCode::OK);

    let records: Vec<DatasetRecord> = serde_json::from_str(&body).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.timestamp.starts_with("2023-04-01")));
}

#[tokio::test]
async fn search_boundaries() {
    for (date, expected) in [
        ("2023-13-01", StatusCode::BAD_REQUEST),
        ("2023-01-32", StatusCode::BAD_REQUEST),
        ("2023-00-01", StatusCode::BAD_REQUEST),
        ("23-01-01", StatusCode::BAD_REQUEST),
        ("2023-02-31", StatusCode::OK),
        ("0000-01-01", StatusCode::OK),
    ] {
        let store = seeded_store();
        let (status, body) = get(router(store.clone()), &format!("/akc/search?date={date}")).await;
        assert_eq!(status, expected, "date {date}");

        if expected == StatusCode::BAD_REQUEST {
            assert_eq!(body, BAD_SEARCH_BODY);
            assert!(store.calls().is_empty(), "store touched for {date}");
        } else {
            assert_eq!(body, "[]");
            assert_eq!(
                store.calls(),
                vec![StoreCall::ScanFiltered {
                    table: "akc-citybikes".to_string(),
                    needle: date.to_string(),
                }]
            );
        }
    }
}

#[tokio::test]
async fn search_without_date_is_bad_request() {
    let store = seeded_store();
    let (status, body) = get(router(store.clone()), "/akc/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, BAD_SEARCH_BODY);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn empty_table_scenario() {
    let app = router(MockStore::new());

    let (status, body) = get(app.clone(), "/akc/all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");

    let (status, body) = get(app, "/akc/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"table":"akc-citybikes","recordCount":0}"#);
}

#[tokio::test]
async fn status_reports_null_when_count_unknown() {
    let store = MockStore::with_config(MockStoreConfig {
        hide_item_count: true,
        ..MockStoreConfig::default()
    });
    let (status, body) = get(router(store), "/akc/status").await;
    assert_eq!(status, StatusCode::OK);

    let summary: TableStatusSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.record_count, None);
}

#[tokio::test]
async fn repeated_requests_return_identical_bodies() {
    let app = router(seeded_store());
    for uri in ["/akc/all", "/akc/status", "/akc/search?date=2023-04-02"] {
        let (_, first) = get(app.clone(), uri).await;
        let (_, second) = get(app.clone(), uri).await;
        assert_eq!(first, second, "{uri}");
    }
}

#[tokio::test]
async fn unreachable_store_yields_500_and_server_still_answers() {
    let app = router(MockStore::unreachable());

    for uri in ["/akc/status", "/akc/all", "/akc/search?date=2023-04-01"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, r#""internal server error""#);
    }

    let (status, body) = get(app, "/akc/server").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("SystemTime"));
}

#[tokio::test]
async fn malformed_items_yield_500() {
    let store = MockStore::with_config(MockStoreConfig {
        corrupt_items: true,
        ..MockStoreConfig::default()
    });
    let (status, body) = get(router(store), "/akc/all").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("Time"), "internal detail leaked: {body}");
}

#[tokio::test(start_paused = true)]
async fn slow_store_is_cut_off_by_deadline() {
    let store = MockStore::with_config(MockStoreConfig {
        latency: Some(Duration::from_secs(5)),
        ..MockStoreConfig::default()
    });
    let config = Config {
        store_timeout_ms: 50,
        ..Config::default()
    };
    let app = router_with(store, &config, MemorySink::new());

    let start = Instant::now();
    let (status, _) = get(app, "/akc/all").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_complete_independently() {
    let store = MockStore::with_config(MockStoreConfig {
        latency: Some(Duration::from_millis(100)),
        ..MockStoreConfig::default()
    });
    store.insert([record("2023-04-01T08:00:00Z", "r1")]);
    let sink = MemorySink::new();
    let app = router_with(store, &Config::default(), sink);

    let uris = [
        "/akc/server",
        "/akc/status",
        "/akc/all",
        "/akc/search?date=2023-04-01",
        "/akc/search?date=bad",
    ];

    let start = Instant::now();
    let results = futures::future::join_all(
        uris.iter()
            .cycle()
            .take(20)
            .map(|uri| {
                let app = app.clone();
                let uri = uri.to_string();
                tokio::spawn(async move { get(app, &uri).await })
            }),
    )
    .await;

    // Paused clock: overlapping calls share one 100ms sleep, serialized ones would add up.
    assert!(start.elapsed() < Duration::from_millis(500));

    for (uri, result) in uris.iter().cycle().zip(results) {
        let (status, body) = result.unwrap();
        match *uri {
            "/akc/search?date=bad" => assert_eq!(status, StatusCode::BAD_REQUEST),
            "/akc/all" | "/akc/search?date=2023-04-01" => {
                assert_eq!(status, StatusCode::OK);
                let records: Vec<DatasetRecord> = serde_json::from_str(&body).unwrap();
                assert_eq!(records.len(), 1);
            }
            _ => assert_eq!(status, StatusCode::OK),
        }
    }
}

#[tokio::test]
async fn failing_log_sink_does_not_affect_responses() {
    let app = router_with(seeded_store(), &Config::default(), MemorySink::failing());
    let (status, body) = get(app, "/akc/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"table":"akc-citybikes","recordCount":3}"#);
}

#[tokio::test]
async fn every_request_produces_one_access_event() {
    let sink = MemorySink::new();
    let config = Config::default();
    let (access_log, worker) = AccessLogger::spawn("server", 64, Some(Arc::new(sink.clone())));
    let state = AppState::new(Arc::new(seeded_store()), access_log, &config);
    let app = create_router(state, &config);

    get(app.clone(), "/akc/server").await;
    get(app.clone(), "/akc/search?date=nope").await;
    get(app.clone(), "/akc/all").await;
    drop(app);
    assert_ok!(worker.await);

    let events = sink.events();
    let summary: Vec<_> = events.iter().map(|e| (e.path.as_str(), e.status)).collect();
    assert_eq!(
        summary,
        vec![
            ("/akc/server", 200),
            ("/akc/search?date=nope", 400),
            ("/akc/all", 200),
        ]
    );
    assert!(events.iter().all(|e| e.tag == "server" && e.method == "GET"));
}

/// Get a live store from environment.
async fn live_store() -> Option<(DynamoStore, Config)> {
    dotenvy::dotenv().ok();

    if std::env::var("AWS_ACCESS_KEY_ID").is_err() && std::env::var("DYNAMODB_ENDPOINT").is_err() {
        return None;
    }

    let config = Config::load().ok()?;
    Some((DynamoStore::from_config(&config).await, config))
}

/// Test that the live table can be described.
#[tokio::test]
#[ignore = "requires AWS credentials or DYNAMODB_ENDPOINT"]
async fn test_live_describe_table() {
    let Some((store, config)) = live_store().await else {
        println!("Skipping: no AWS credentials or DYNAMODB_ENDPOINT");
        return;
    };

    let summary = store.describe_table(&config.table_name).await;
    let summary = assert_ok!(summary);
    assert_eq!(summary.table_name, config.table_name);
    println!("Record count: {:?}", summary.record_count);
}

/// Test that a filtered scan only returns matching records.
#[tokio::test]
#[ignore = "requires AWS credentials or DYNAMODB_ENDPOINT"]
async fn test_live_filtered_scan() {
    let Some((store, config)) = live_store().await else {
        println!("Skipping: no AWS credentials or DYNAMODB_ENDPOINT");
        return;
    };

    let records = assert_ok!(store.scan_filtered(&config.table_name, "2023-04-01").await);
    assert!(records.iter().all(|r| r.timestamp.contains("2023-04-01")));
    println!("Found {} records", records.len());
}

/// Test that a missing table is reported as an error.
#[tokio::test]
#[ignore = "requires AWS credentials or DYNAMODB_ENDPOINT"]
async fn test_live_missing_table() {
    let Some((store, _)) = live_store().await else {
        println!("Skipping: no AWS credentials or DYNAMODB_ENDPOINT");
        return;
    };

    assert_err!(store.describe_table("citybikes-table-that-does-not-exist").await);
}
