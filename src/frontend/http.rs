//! HTTP API
//!
//! | Method | Path          | Input               | Response                 |
//! |--------|---------------|---------------------|--------------------------|
//! | GET    | `/`           |                     | 200 landing page         |
//! | GET    | `/initialize` |                     | 204, store erased        |
//! | GET    | `/get`        | query `key`         | 200 value or empty body  |
//! | POST   | `/set`        | form `key`, `val`   | 200 / 500                |
//! | POST   | `/increment`  | form `key`          | 200 / 500                |
//! | GET    | `/health`     |                     | 200 / 503 JSON           |
//!
//! Form fields come from an urlencoded or multipart body, then the query
//! string; the first value of a repeated field wins. Missing parameters are
//! read as empty strings and passed to the store unchanged. A body that is
//! not form data is rejected before any store call.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

use crate::client::KvClient;
use crate::common::request_tracing_middleware;
use crate::frontend::params::{FormValues, QueryValues};
use crate::frontend::views::Views;

/// Body of a successful write
pub const SUCCESS_BODY: &str = "Success";

/// Body of a failed write
pub const FAILURE_BODY: &str = "InternalServerError";

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const INDEX_TEMPLATE: &str = "index";

#[derive(Clone)]
pub struct AppState {
    pub client: KvClient,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(client: KvClient, views: Views) -> Self {
        Self {
            client,
            views: Arc::new(views),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/initialize", get(initialize))
        .route("/get", get(get_object))
        .route("/set", post(set_object))
        .route("/increment", post(increment_object))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_tracing_middleware))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    match state.views.render(INDEX_TEMPLATE) {
        Ok(body) => Html(body.to_string()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render landing page");
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
        }
    }
}

async fn initialize(State(state): State<AppState>) -> StatusCode {
    state.client.flush_all().await;
    StatusCode::NO_CONTENT
}

async fn get_object(
    State(state): State<AppState>,
    QueryValues(params): QueryValues,
) -> String {
    state.client.get_string(params.value("key")).await
}

async fn set_object(
    State(state): State<AppState>,
    params: FormValues,
) -> (StatusCode, &'static str) {
    let key = params.value("key");
    match state.client.set_string(key, params.value("val")).await {
        Ok(()) => (StatusCode::OK, SUCCESS_BODY),
        Err(e) => {
            tracing::warn!(key, error = %e, "SET failed");
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
        }
    }
}

async fn increment_object(
    State(state): State<AppState>,
    params: FormValues,
) -> (StatusCode, &'static str) {
    let key = params.value("key");
    match state.client.incr(key).await {
        Ok(()) => (StatusCode::OK, SUCCESS_BODY),
        Err(e) => {
            tracing::warn!(key, error = %e, "INCR failed");
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.client.pool_stats();
    match state.client.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "store": "up",
                "idle_connections": stats.idle,
                "pool": stats,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "store": "down",
                "error": e.to_string(),
                "idle_connections": stats.idle,
                "pool": stats,
            })),
        ),
    }
}
