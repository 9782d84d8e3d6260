//! Route table and handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use proxy::{RequestId, SaveRequest, SyncError, SyncProxy};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<SyncProxy>,
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    path: Option<String>,
}

/// Builds the application router. Request bodies larger than `body_limit`
/// bytes are rejected with 413.
pub fn router(proxy: Arc<SyncProxy>, cors: CorsLayer, body_limit: usize) -> Router {
    Router::new()
        .route(
            "/api/sync",
            get(fetch_file)
                .post(save_file)
                .fallback(method_not_allowed),
        )
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    request_id = %RequestId::new_random(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
        .with_state(AppState { proxy })
}

async fn fetch_file(
    State(state): State<AppState>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::read(SyncError::bad_request(rejection.body_text())))?;
    let file = state
        .proxy
        .fetch(params.path.as_deref())
        .await
        .map_err(ApiError::read)?;
    Ok(Json(file.content))
}

async fn save_file(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let status = rejection.status();
        let err = ApiError::write(SyncError::bad_request(rejection.body_text()));
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            err.with_status(status)
        } else {
            err
        }
    })?;
    let commit = state.proxy.save(request).await.map_err(ApiError::write)?;
    Ok(Json(json!({
        "success": true,
        "message": "File updated successfully on GitHub",
        "commit": commit,
    })))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}
