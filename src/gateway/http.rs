//! HTTP API for the upload gateway

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::common::auth::{require_auth, AuthUser, Authenticator};
use crate::twopc::{OperationDescriptor, OperationPayload, TxnCoordinator, OP_DELETE, OP_UPLOAD};

#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<TxnCoordinator>,
    pub auth: Arc<Authenticator>,
    pub http: reqwest::Client,
    pub metadata_api: String,
    pub storage_api: String,
    pub node_id: String,
}

pub fn create_router(state: GatewayState, max_upload_bytes: usize) -> Router {
    let protected = Router::new()
        .route("/files/upload", post(upload_file))
        .route("/files", get(list_files))
        .route("/files/:filename", get(download_file).delete(delete_file))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_auth,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes));

    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Auth routes
// ============================================================================

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn signup(
    State(state): State<GatewayState>,
    Json(creds): Json<Credentials>,
) -> impl IntoResponse {
    if creds.username.is_empty() || creds.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing username or password" })),
        )
            .into_response();
    }

    // Hash before the password ever leaves the gateway
    let hashed = match state.auth.hash_password(&creds.password) {
        Ok(h) => h,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response();
        }
    };

    let resp = state
        .http
        .post(format!("{}/users", state.metadata_api))
        .json(&json!({ "username": creds.username, "password": hashed }))
        .send()
        .await;

    match resp {
        Ok(resp) if resp.status() == reqwest::StatusCode::CREATED => (
            StatusCode::CREATED,
            Json(json!({ "message": "Signup successful!" })),
        )
            .into_response(),
        Ok(resp) if resp.status() == reqwest::StatusCode::CONFLICT => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Username already exists" })),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Metadata service error" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{}", e) })),
        )
            .into_response(),
    }
}

async fn login(
    State(state): State<GatewayState>,
    Json(creds): Json<Credentials>,
) -> impl IntoResponse {
    if creds.username.is_empty() || creds.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing username or password" })),
        )
            .into_response();
    }

    let resp = state
        .http
        .get(format!("{}/users/{}", state.metadata_api, creds.username))
        .send()
        .await;

    let user: serde_json::Value = match resp {
        Ok(resp) if resp.status().is_success() => match resp.json().await {
            Ok(user) => user,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("{}", e) })),
                )
                    .into_response();
            }
        },
        Ok(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response();
        }
    };

    let stored_hash = user["password"].as_str().unwrap_or_default();
    if state.auth.verify_password(&creds.password, stored_hash) {
        match state.auth.issue_token(&creds.username) {
            Ok(token) => Json(json!({ "token": token })).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response()
    }
}

// ============================================================================
// File routes
// ============================================================================

/// Upload a file transactionally: both the storage and the metadata node
/// stage the write during the vote round and apply it on global commit.
async fn upload_file(
    State(state): State<GatewayState>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut filename = String::new();
    let mut file_data: Option<Vec<u8>> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => file_data = Some(bytes.to_vec()),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": format!("{}", e) })),
                        )
                            .into_response();
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("{}", e) })),
                )
                    .into_response();
            }
        }
    }

    let file_data = match file_data {
        Some(data) if !filename.is_empty() => data,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file part" })),
            )
                .into_response();
        }
    };

    let path = format!("/storage/{}", filename);
    let metadata = json!({
        "filename": filename,
        "path": path,
        "size": file_data.len(),
        "version": 1,
        "checksum": blake3::hash(&file_data).to_hex().to_string(),
        "user": username,
    });

    let payload = match OperationPayload::with_file(&metadata, &file_data) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                e.to_http_status(),
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response();
        }
    };

    let outcome = state
        .coordinator
        .execute(OperationDescriptor::new(OP_UPLOAD, payload))
        .await;

    if outcome.success {
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "File uploaded successfully using 2PC",
                "transaction_id": outcome.transaction_id,
                "filename": filename,
                "path": path,
                "warnings": outcome.warnings,
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "2PC transaction failed",
                "message": outcome.message,
                "transaction_id": outcome.transaction_id,
            })),
        )
            .into_response()
    }
}

/// Delete a file transactionally through the same coordinator.
async fn delete_file(
    State(state): State<GatewayState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    let payload = match OperationPayload::from_metadata(&json!({ "filename": filename })) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                e.to_http_status(),
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response();
        }
    };

    let outcome = state
        .coordinator
        .execute(OperationDescriptor::new(OP_DELETE, payload))
        .await;

    if outcome.success {
        (
            StatusCode::OK,
            Json(json!({
                "status": "deleted",
                "transaction_id": outcome.transaction_id,
                "warnings": outcome.warnings,
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "2PC transaction failed",
                "message": outcome.message,
                "transaction_id": outcome.transaction_id,
            })),
        )
            .into_response()
    }
}

async fn list_files(State(state): State<GatewayState>) -> impl IntoResponse {
    let resp = state
        .http
        .get(format!("{}/files", state.metadata_api))
        .send()
        .await;

    match resp {
        Ok(resp) if resp.status().is_success() => match resp.json::<serde_json::Value>().await {
            Ok(files) => Json(files).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response(),
        },
        Ok(resp) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Metadata error: {}", resp.status()) })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{}", e) })),
        )
            .into_response(),
    }
}

async fn download_file(
    State(state): State<GatewayState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    let resp = state
        .http
        .get(format!("{}/download", state.storage_api))
        .query(&[("filename", &filename)])
        .send()
        .await;

    match resp {
        Ok(resp) if resp.status().is_success() => match resp.bytes().await {
            Ok(bytes) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{}", e) })),
            )
                .into_response(),
        },
        Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
        Ok(resp) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Storage error: {}", resp.status()) })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{}", e) })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "node_id": state.node_id,
        "role": "gateway",
        "participants": state.coordinator.registry().len(),
    }))
}
