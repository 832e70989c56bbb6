use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use registry_core::ports::{UserCache, UserStore};
use registry_core::RegistryError;
use registry_server::storage::memory::{MemoryCache, MemoryStore};
use registry_server::{build_router, AppState};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

async fn start_server(
    state: AppState,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_router(state, Duration::from_secs(5));

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        cache: Arc::new(MemoryCache::new()),
    };
    (state, store)
}

/// A cache whose every operation fails, for exercising the advisory-cache
/// degradation paths.
struct BrokenCache;

#[async_trait]
impl UserCache for BrokenCache {
    async fn set(&self, _key: &str, _value: &str) -> registry_core::Result<()> {
        Err(RegistryError::Cache("cache is down".to_string()))
    }

    async fn get(&self, _key: &str) -> registry_core::Result<Option<String>> {
        Err(RegistryError::Cache("cache is down".to_string()))
    }
}

#[tokio::test]
async fn add_then_check_round_trip() {
    let (state, _store) = memory_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    // POST /addUser
    let resp = client
        .post(format!("{base}/addUser"))
        .json(&json!({ "username": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "User added successfully");

    // GET /checkUser/bob returns both sources
    let resp = client
        .get(format!("{base}/checkUser/bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cache"], "bob");
    assert_eq!(body["database"], "bob");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn duplicate_add_succeeds_both_times() {
    let (state, _store) = memory_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/addUser"))
            .json(&json!({ "username": "alice" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalid_bodies_are_client_errors() {
    let (state, store) = memory_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    // Empty username
    let resp = client
        .post(format!("{base}/addUser"))
        .json(&json!({ "username": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Missing username field
    let resp = client
        .post(format!("{base}/addUser"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Malformed JSON
    let resp = client
        .post(format!("{base}/addUser"))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // No row was created by any of the rejected requests
    assert!(store.get_registered("").await.unwrap().is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn stale_cache_hit_reports_database_miss() {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let state = AppState {
        store,
        cache: cache.clone(),
    };

    // A cache entry with no matching row, as after an out-of-band eviction
    // of the durable side
    cache.set("userCacheKey:ghost", "ghost").await.unwrap();

    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/checkUser/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cache"], "ghost");
    assert_eq!(body["database"], "not found");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let (state, _store) = memory_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/checkUser/nobody"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn received_users_list_is_idempotent() {
    let (state, store) = memory_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    // Empty list before any broadcast arrives
    let resp = client
        .get(format!("{base}/checkReceivedMsgs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));

    // The same broadcast delivered twice records one row
    store.add_received("carol").await.unwrap();
    store.add_received("carol").await.unwrap();

    let resp = client
        .get(format!("{base}/checkReceivedMsgs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!(["carol"]));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn cache_failure_does_not_fail_registration() {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        cache: Arc::new(BrokenCache),
    };
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    // The durable write alone decides the outcome
    let resp = client
        .post(format!("{base}/addUser"))
        .json(&json!({ "username": "dave" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(store.get_registered("dave").await.unwrap().is_some());

    // Lookup still answers from the database slot only
    let resp = client
        .get(format!("{base}/checkUser/dave"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["database"], "dave");
    assert!(body.get("cache").is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
