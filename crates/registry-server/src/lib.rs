//! User Registry Server
//!
//! HTTP registration API backed by PostgreSQL with an advisory Redis cache,
//! plus a background listener that records usernames broadcast over a
//! fan-out pub/sub channel. The two write paths share nothing but the
//! durable store.

pub mod config;
pub mod handlers;
pub mod ingest;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use registry_core::ports::{UserCache, UserStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub cache: Arc<dyn UserCache>,
}

/// Build the HTTP router for the registry API.
///
/// Every request is bounded by `request_timeout`; handlers otherwise rely on
/// the adapters' own connection-safety and apply no locking of their own.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/addUser", post(handlers::users::add_user))
        .route("/checkUser/:username", get(handlers::users::check_user))
        .route(
            "/checkReceivedMsgs",
            get(handlers::users::check_received_msgs),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
