use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E2xxx: Discovery errors (likes, matches, quiz)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,

    // Discovery (E2xxx)
    AlreadyLiked,
    QuizNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",

            // Discovery
            Self::AlreadyLiked => "E2001",
            Self::QuizNotFound => "E2002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::QuizNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyLiked => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// The error a repeated like on the same ordered pair resolves to.
    pub fn already_liked() -> Self {
        Self::new(ErrorCode::AlreadyLiked, "Already liked this profile")
    }

    /// Wraps an infrastructure failure. The cause is logged when the error is
    /// rendered and never sent to the caller.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// The code this error renders with, regardless of variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn discovery_codes_map_to_expected_statuses() {
        assert_eq!(ErrorCode::AlreadyLiked.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::QuizNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::AlreadyLiked.code(), "E2001");
    }

    #[tokio::test]
    async fn already_liked_renders_conflict_with_message() {
        let (status, value) = body_json(AppError::already_liked()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "E2001");
        assert_eq!(value["error"]["message"], "Already liked this profile");
    }

    #[tokio::test]
    async fn validation_renders_bad_request() {
        let (status, value) = body_json(AppError::validation("uid is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], "E0002");
        assert_eq!(value["error"]["message"], "uid is required");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_cause() {
        let err = AppError::internal(anyhow::anyhow!("connection refused on 10.0.0.3:5432"));
        let (status, value) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"]["message"], "internal server error");
        assert!(!value.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn validation_details_render_alongside_message() {
        let err = AppError::with_details(
            ErrorCode::ValidationError,
            "uid is required",
            serde_json::json!({ "uid": [{ "code": "blank" }] }),
        );
        let (status, value) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["code"], "E0002");
        assert_eq!(value["error"]["details"]["uid"][0]["code"], "blank");

        let (_, value) = body_json(AppError::validation("uid is required")).await;
        assert!(value["error"].get("details").is_none());
    }

    #[test]
    fn error_code_reflects_variant() {
        assert_eq!(AppError::validation("x").error_code(), ErrorCode::ValidationError);
        assert_eq!(AppError::already_liked().error_code(), ErrorCode::AlreadyLiked);
        assert_eq!(
            AppError::Database(diesel::result::Error::NotFound).error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            AppError::internal(anyhow::anyhow!("boom")).error_code(),
            ErrorCode::InternalError
        );
    }
}
