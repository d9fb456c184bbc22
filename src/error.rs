// src/error.rs
// =============================================================================
// The error taxonomy every HTTP handler reports.
//
// Errors are tags, not exception types: each variant maps to a short
// machine-readable string (`missing_params`, `github_error`, ...) plus a
// human-readable message, and to an HTTP status. Upstream failures keep the
// upstream status verbatim.
//
// JSON shape:
//   { "error": "github_error", "status": 404, "message": "Not Found" }
//   { "error": "missing_params", "note": "Required query: id", "message": "..." }
// =============================================================================

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Shorthand used throughout the github and server modules.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required query parameter was absent or empty.
    #[error("missing required parameter: {note}")]
    MissingParams { note: String },

    /// A parameter was present but malformed (e.g. a non-numeric id).
    #[error("invalid id: {message}")]
    InvalidId { message: String },

    /// Any other malformed query parameter.
    #[error("invalid parameter: {message}")]
    InvalidParams { message: String },

    /// GitHub answered with a non-2xx status.
    #[error("GitHub returned {status}: {message}")]
    Github { status: u16, message: String },

    /// The whole operation exceeded a caller-supplied deadline.
    #[error("timed out: {message}")]
    Timeout { message: String },

    /// Transport failure, undecodable body, or anything else unexpected.
    #[error("{message}")]
    Unknown { message: String },

    /// A failure inside this service rather than upstream.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn missing(note: impl Into<String>) -> Self {
        ApiError::MissingParams { note: note.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidParams {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl ToString) -> Self {
        ApiError::Unknown {
            message: message.to_string(),
        }
    }

    /// True when upstream said the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Github { status: 404, .. })
    }

    /// The machine-readable tag clients switch on.
    pub fn tag(&self) -> &'static str {
        match self {
            ApiError::MissingParams { .. } => "missing_params",
            ApiError::InvalidId { .. } => "invalid_id",
            ApiError::InvalidParams { .. } => "invalid_params",
            ApiError::Github { .. } => "github_error",
            ApiError::Timeout { .. } => "timeout",
            ApiError::Unknown { .. } => "unknown_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// HTTP status for the response. Upstream statuses pass through when valid.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParams { .. }
            | ApiError::InvalidId { .. }
            | ApiError::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            ApiError::Github { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unknown { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Transport errors and body decode failures both land in `unknown_error`
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::unknown(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::unknown(err)
    }
}

/// Wire form of an [`ApiError`].
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub message: String,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        let (status, note, message) = match err {
            ApiError::MissingParams { note } => (None, Some(note.clone()), err.to_string()),
            ApiError::Github { status, message } => (Some(*status), None, message.clone()),
            ApiError::InvalidId { message }
            | ApiError::InvalidParams { message }
            | ApiError::Timeout { message }
            | ApiError::Unknown { message }
            | ApiError::Internal { message } => (None, None, message.clone()),
        };
        ErrorBody {
            error: err.tag(),
            status,
            note,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody::from(&self);
        // Error responses must never be cached at the edge
        (
            status,
            [(header::CACHE_CONTROL, "no-store")],
            Json(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_statuses() {
        let missing = ApiError::missing("Required query: id");
        assert_eq!(missing.tag(), "missing_params");
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::Github {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(upstream.tag(), "github_error");
        assert_eq!(upstream.status_code(), StatusCode::NOT_FOUND);

        let unknown = ApiError::unknown("connection reset");
        assert_eq!(unknown.tag(), "unknown_error");
        assert_eq!(unknown.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_out_of_range_upstream_status_becomes_bad_gateway() {
        let err = ApiError::Github {
            status: 42,
            message: "weird".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::from(&ApiError::Github {
            status: 403,
            message: "API rate limit exceeded".to_string(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "github_error");
        assert_eq!(json["status"], 403);
        assert_eq!(json["message"], "API rate limit exceeded");
        assert!(json.get("note").is_none());

        let body = ErrorBody::from(&ApiError::missing("Required query: id"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["note"], "Required query: id");
        assert!(json.get("status").is_none());
    }
}
