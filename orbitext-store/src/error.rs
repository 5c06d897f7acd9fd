//! Store and API error types.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors raised by an [`ObjectStore`](crate::store::ObjectStore).
#[derive(Debug)]
pub enum StoreError {
    /// Nothing is stored under the key.
    NotFound(String),
    /// The backing storage failed.
    Io(std::io::Error),
    /// The stored bytes are not UTF-8 text.
    InvalidText(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(key) => write!(f, "对象不存在: {}", key),
            StoreError::Io(e) => write!(f, "存储访问失败: {}", e),
            StoreError::InvalidText(key) => write!(f, "对象不是有效的文本: {}", key),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(e.to_string())
        } else {
            StoreError::Io(e)
        }
    }
}

/// A failed request. Every variant answers 400 `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// No route for the path.
    UnknownRoute,
    /// The route exists under a different method.
    MethodNotAllowed(&'static str),
    /// The request body is missing or not a JSON object.
    EmptyBody,
    /// `text` is missing, empty or not a string.
    MissingText,
    /// The storage task could not complete.
    Task(String),
    Store(StoreError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UnknownRoute => write!(f, "未知的路由路径"),
            ApiError::MethodNotAllowed(method) => write!(f, "方法不允许，请使用{}", method),
            ApiError::EmptyBody => write!(f, "请求体为空"),
            ApiError::MissingText => write!(f, "缺少text参数"),
            ApiError::Task(e) => write!(f, "存储任务失败: {}", e),
            ApiError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::MissingText.to_string(), "缺少text参数");
        assert_eq!(ApiError::MethodNotAllowed("POST").to_string(), "方法不允许，请使用POST");
        assert_eq!(ApiError::UnknownRoute.to_string(), "未知的路由路径");
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let e: StoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, StoreError::NotFound(_)));
        let e: StoreError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no").into();
        assert!(matches!(e, StoreError::Io(_)));
    }

    #[test]
    fn test_api_error_is_bad_request() {
        let response = ApiError::EmptyBody.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
