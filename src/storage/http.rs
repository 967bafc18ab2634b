//! HTTP API for the storage node (downloads and non-transactional deletes)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use super::store::FileStore;

#[derive(Clone)]
pub struct StorageState {
    pub store: Arc<FileStore>,
    pub node_id: String,
}

pub fn create_router(state: StorageState) -> Router {
    Router::new()
        .route("/download", get(download_file))
        .route("/delete", delete(delete_file))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    filename: String,
}

async fn download_file(
    State(state): State<StorageState>,
    Query(query): Query<FileQuery>,
) -> impl IntoResponse {
    match state.store.read(&query.filename) {
        Ok(Some(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", query.filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
        Err(e) => (
            e.to_http_status(),
            Json(json!({ "error": format!("{}", e) })),
        )
            .into_response(),
    }
}

async fn delete_file(
    State(state): State<StorageState>,
    Query(query): Query<FileQuery>,
) -> impl IntoResponse {
    match state.store.delete(&query.filename) {
        Ok(true) => (StatusCode::OK, Json(json!({ "status": "deleted" }))).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
        Err(e) => (
            e.to_http_status(),
            Json(json!({ "error": format!("{}", e) })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<StorageState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "node_id": state.node_id, "role": "storage" }))
}
