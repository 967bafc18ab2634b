//! HTTP API for the metadata node (file record and user CRUD)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use super::store::{FileRecord, MetadataStore, UserRecord};

#[derive(Clone)]
pub struct MetadataState {
    pub store: Arc<MetadataStore>,
    pub node_id: String,
}

pub fn create_router(state: MetadataState) -> Router {
    Router::new()
        .route("/files", post(add_file).get(list_files))
        .route("/files/:filename", get(get_file).delete(delete_file))
        .route("/users", post(add_user))
        .route("/users/:username", get(get_user))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn add_file(
    State(state): State<MetadataState>,
    Json(record): Json<FileRecord>,
) -> impl IntoResponse {
    if record.filename.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Filename is required" })),
        )
            .into_response();
    }
    state.store.put_file(record.clone());
    (StatusCode::CREATED, Json(json!(record))).into_response()
}

async fn get_file(
    State(state): State<MetadataState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    match state.store.get_file(&filename) {
        Some(record) => (StatusCode::OK, Json(json!(record))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
    }
}

async fn delete_file(
    State(state): State<MetadataState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    if state.store.delete_file(&filename) {
        (StatusCode::OK, Json(json!({ "status": "deleted" }))).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response()
    }
}

async fn list_files(State(state): State<MetadataState>) -> impl IntoResponse {
    Json(json!(state.store.list_files()))
}

async fn add_user(
    State(state): State<MetadataState>,
    Json(record): Json<UserRecord>,
) -> impl IntoResponse {
    if record.username.is_empty() || record.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing username or password" })),
        )
            .into_response();
    }
    match state.store.put_user(record) {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "message": "User created" }))).into_response(),
        Err(e) => (
            e.to_http_status(),
            Json(json!({ "error": "Username already exists" })),
        )
            .into_response(),
    }
}

async fn get_user(
    State(state): State<MetadataState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    match state.store.get_user(&username) {
        Some(user) => (StatusCode::OK, Json(json!(user))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<MetadataState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "node_id": state.node_id,
        "role": "metadata",
        "files": state.store.file_count(),
    }))
}
