//! HTTP store for the orbitext label text.
//!
//! Two endpoints keep a single UTF-8 blob in an [`ObjectStore`]:
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/text/add` | POST `{"text": "..."}` | `{"message": "文本保存成功"}` |
//! | `/text/get` | GET | `{"text": "..."}` |
//! | `/healthz` | GET | `ok` |
//!
//! Every failure, including unknown paths and wrong methods, answers
//! 400 `{"error": "..."}`.

pub mod error;
pub mod store;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, StoreError};
pub use store::{object_key, FsStore, MemoryStore, ObjectStore};

/// Reply to a successful save.
pub const SAVED_MESSAGE: &str = "文本保存成功";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ObjectStore>,
    bucket: Arc<str>,
    key: Arc<str>,
}

impl AppState {
    /// State serving `<directory>/content.txt` in `bucket`.
    pub fn new(store: impl ObjectStore, bucket: &str, directory: &str) -> Self {
        Self {
            store: Arc::new(store),
            bucket: bucket.into(),
            key: object_key(directory).into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/text/add", post(add_text).fallback(expect_post))
        .route("/text/get", get(get_text).fallback(expect_get))
        .fallback(unknown_route)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn unknown_route() -> ApiError {
    ApiError::UnknownRoute
}

async fn expect_post() -> ApiError {
    ApiError::MethodNotAllowed("POST")
}

async fn expect_get() -> ApiError {
    ApiError::MethodNotAllowed("GET")
}

/// The non-empty `text` string of a request body.
fn parse_text(body: &[u8]) -> Result<String, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyBody);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingText)?;
    match value.get("text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ApiError::MissingText),
    }
}

async fn add_text(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let text = parse_text(&body)?;
    let len = text.len();

    let store = state.store.clone();
    let (bucket, key) = (state.bucket.clone(), state.key.clone());
    tokio::task::spawn_blocking(move || store.put(&bucket, &key, Bytes::from(text)))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    info!("saved {} bytes to {}/{}", len, state.bucket, state.key);
    Ok(Json(json!({ "message": SAVED_MESSAGE })))
}

async fn get_text(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    let (bucket, key) = (state.bucket.clone(), state.key.clone());
    let data = tokio::task::spawn_blocking(move || store.get(&bucket, &key))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    let text = String::from_utf8(data.to_vec())
        .map_err(|_| StoreError::InvalidText(state.key.to_string()))?;
    Ok(Json(json!({ "text": text })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(br#"{"text":"hi"}"#).unwrap(), "hi");
        // Falsy-looking strings are still text
        assert_eq!(parse_text(br#"{"text":"0"}"#).unwrap(), "0");
        assert_eq!(parse_text(br#"{"text":" "}"#).unwrap(), " ");
        assert!(matches!(parse_text(b""), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_text(b"  \n"), Err(ApiError::EmptyBody)));
        assert!(matches!(parse_text(br#"{"text":""}"#), Err(ApiError::MissingText)));
        assert!(matches!(parse_text(br#"{"other":"x"}"#), Err(ApiError::MissingText)));
        assert!(matches!(parse_text(br#"{"text":5}"#), Err(ApiError::MissingText)));
        assert!(matches!(parse_text(b"not json"), Err(ApiError::MissingText)));
    }

    #[test]
    fn test_state_key() {
        let state = AppState::new(MemoryStore::new(), "bucket", "notes");
        assert_eq!(state.bucket(), "bucket");
        assert_eq!(state.key(), "notes/content.txt");
    }
}
