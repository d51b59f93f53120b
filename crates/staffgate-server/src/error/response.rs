//! Error response implementation.

use super::types::ApiError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use staffgate_access::{AccessError, IdentityError, ImpersonationError};
use staffgate_audit_types::AuditError;
use std::collections::HashMap;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, code = self.error_code(), "Server error occurred");
        } else if matches!(self, ApiError::Unauthorized | ApiError::Forbidden) {
            warn!(error = %self, code = self.error_code(), "Auth error occurred");
        }

        let status = self.status_code();
        let code = self.error_code();

        let (message, fields) = match &self {
            ApiError::ValidationError(field_errors) => (self.to_string(), Some(field_errors.clone())),
            ApiError::Internal(err) => {
                let message = if cfg!(debug_assertions) {
                    format!("{}: {}", self, err)
                } else {
                    "An internal error occurred".to_string()
                };
                (message, None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody { code, message, fields },
        };

        (status, Json(body)).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::TokenExpired,
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<ImpersonationError> for ApiError {
    fn from(err: ImpersonationError) -> Self {
        match err {
            ImpersonationError::AlreadyImpersonating => ApiError::Conflict(err.to_string()),
            ImpersonationError::NotPermitted | ImpersonationError::Escalation => ApiError::Forbidden,
            ImpersonationError::SelfTarget => ApiError::BadRequest(err.to_string()),
            ImpersonationError::TargetUnavailable => ApiError::NotFound("Impersonation target".into()),
            ImpersonationError::SessionMismatch => ApiError::Unauthorized,
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(_: IdentityError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        error!(error = %err, "Access backend unavailable");
        ApiError::ServiceUnavailable
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ApiError::ValidationError(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_impersonation_errors_map_to_statuses() {
        let status = |e: ImpersonationError| ApiError::from(e).status_code();
        assert_eq!(status(ImpersonationError::AlreadyImpersonating), StatusCode::CONFLICT);
        assert_eq!(status(ImpersonationError::NotPermitted), StatusCode::FORBIDDEN);
        assert_eq!(status(ImpersonationError::Escalation), StatusCode::FORBIDDEN);
        assert_eq!(status(ImpersonationError::SelfTarget), StatusCode::BAD_REQUEST);
        assert_eq!(status(ImpersonationError::TargetUnavailable), StatusCode::NOT_FOUND);
        assert_eq!(status(ImpersonationError::SessionMismatch), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forbidden_body_is_uniform() {
        let response = ApiError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "forbidden");
        assert_eq!(body["error"]["message"], "Access denied");
    }
}
