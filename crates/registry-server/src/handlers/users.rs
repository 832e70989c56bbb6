//! User registration and lookup handlers

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use registry_core::{cache_key, validate_username};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    #[serde(default)]
    username: String,
}

/// Merged lookup result. Either field may be absent; `database` is the
/// authoritative one.
#[derive(Debug, Default, Serialize)]
pub struct CheckUserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
}

pub async fn add_user(
    State(state): State<AppState>,
    body: Result<Json<AddUserRequest>, JsonRejection>,
) -> Result<&'static str, StatusCode> {
    let Json(req) = body.map_err(|e| {
        warn!("Rejected addUser body: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    validate_username(&req.username).map_err(|_| StatusCode::BAD_REQUEST)?;

    state.store.add_registered(&req.username).await.map_err(|e| {
        error!("Failed to persist user {}: {}", req.username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // The cache is advisory: a failed write degrades later reads, it does
    // not undo or fail the registration.
    if let Err(e) = state
        .cache
        .set(&cache_key(&req.username), &req.username)
        .await
    {
        warn!("Cache write failed for {}: {}", req.username, e);
    }

    info!("User registered: {}", req.username);
    Ok("User added successfully")
}

pub async fn check_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<CheckUserResponse>, StatusCode> {
    let mut response = CheckUserResponse::default();

    // Best-effort cache read; a miss or failure is not an error here.
    match state.cache.get(&cache_key(&username)).await {
        Ok(hit) => response.cache = hit,
        Err(e) => warn!("Cache read failed for {}: {}", username, e),
    }

    let row = state.store.get_registered(&username).await.map_err(|e| {
        error!("Failed to look up user {}: {}", username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Absence in both sources is a client-facing miss, not a server error.
    if row.is_none() && response.cache.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    // The database slot always answers once the query succeeded, with a
    // marker when the row is absent.
    response.database = Some(match row {
        Some(user) => user.username,
        None => "not found".to_string(),
    });

    Ok(Json(response))
}

pub async fn check_received_msgs(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, StatusCode> {
    match state.store.list_received().await {
        Ok(users) => Ok(Json(users.into_iter().map(|u| u.username).collect())),
        Err(e) => {
            error!("Failed to list received users: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
