use crate::static_files::{StaticFile, StaticFiles, StaticLookup};
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Greeting returned by `GET /api`
pub const API_WELCOME: &str = "Welcome to the Interval Training App API";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiMessage {
    pub message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub static_files: Arc<StaticFiles>,
}

impl AppState {
    #[must_use]
    pub fn new(static_files: StaticFiles) -> Self {
        Self {
            static_files: Arc::new(static_files),
        }
    }
}

/// `/api` plus the client bundle for every other path
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(api_root))
        .fallback(serve_static)
        .with_state(state)
}

pub async fn api_root() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: API_WELCOME.to_string(),
    })
}

pub async fn serve_static(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match state.static_files.lookup(uri.path()).await {
        StaticLookup::Found(file) | StaticLookup::Fallback(file) => file_response(file),
        StaticLookup::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn file_response(file: StaticFile) -> Response {
    ([(header::CONTENT_TYPE, file.content_type)], file.body).into_response()
}
