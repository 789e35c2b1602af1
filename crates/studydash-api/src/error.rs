//! HTTP error responses.
//!
//! Every failure renders as `{"error": message}` with the matching status.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use studydash_core::Error;

use crate::cookie::removal_cookie;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    /// 401 that also expires the session cookie.
    SessionRejected { message: String, secure: bool },
    Conflict(String),
    NotFound(String),
    TooManyRequests(String),
    /// Rendered as-is; the cause is logged where the error is created.
    Internal(String),
}

impl ApiError {
    pub fn session_rejected(message: impl Into<String>, secure: bool) -> Self {
        ApiError::SessionRejected {
            message: message.into(),
            secure,
        }
    }

    /// Map a core error for an endpoint. Client-class errors keep their own
    /// message; anything else is logged and answered with `fallback`.
    pub fn with_fallback(err: Error, fallback: &str) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => {
                error!(subsystem = "api", error = %other, "{}", fallback);
                ApiError::Internal(fallback.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::SessionRejected { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::with_fallback(err, "Server error")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(subsystem = "api", error = %rejection.body_text(), "Rejected request body");
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::SessionRejected { message, secure } => (
                status,
                [(header::SET_COOKIE, removal_cookie(secure).to_string())],
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Conflict(message)
            | ApiError::NotFound(message)
            | ApiError::TooManyRequests(message)
            | ApiError::Internal(message) => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let err = ApiError::with_fallback(Error::Conflict("taken".to_string()), "Registration failed");
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "taken"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_server_errors_use_fallback() {
        let err = ApiError::with_fallback(Error::Internal("boom".to_string()), "Login failed");
        assert!(matches!(err, ApiError::Internal(ref m) if m == "Login failed"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_session_rejected_clears_cookie() {
        let response = ApiError::session_rejected("Invalid token", false).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("auth_token=;"));
    }

    #[test]
    fn test_plain_unauthorized_leaves_cookie() {
        let response = ApiError::Unauthorized("Authentication required".to_string()).into_response();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
