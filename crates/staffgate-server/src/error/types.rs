//! API error types.

use axum::http::StatusCode;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error enum covering all error cases.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    ValidationError(HashMap<String, Vec<String>>),

    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    // 401 Unauthorized
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // 403 Forbidden. Every denial reason shares one body.
    #[error("Access denied")]
    Forbidden,

    // 404 Not Found
    #[error("{0} not found")]
    NotFound(String),

    // 409 Conflict
    #[error("State conflict: {0}")]
    Conflict(String),

    // 500 Internal Server Error
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // 503 Service Unavailable
    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl ApiError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) | Self::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,

            Self::Unauthorized | Self::TokenExpired | Self::InvalidToken => StatusCode::UNAUTHORIZED,

            Self::Forbidden => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::Conflict(_) => StatusCode::CONFLICT,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidQueryParam(_) => "invalid_query_param",
            Self::Unauthorized => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }

    /// Check if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(ApiError::Internal(anyhow::anyhow!("boom")).is_server_error());
        assert!(ApiError::NotFound("Facility".into()).is_client_error());
    }
}
