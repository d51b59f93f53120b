//! Standard API response types.

use axum::{
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use staffgate_audit_capture::AuditChanges;

/// Standard API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

/// Response metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Request id assigned by the guard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    pub fn now() -> Self {
        Self {
            request_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_request_id(mut self, id: impl ToString) -> Self {
        self.request_id = Some(id.to_string());
        self
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::now(),
        }
    }

    pub fn with_request_id(mut self, id: impl ToString) -> Self {
        self.meta = self.meta.with_request_id(id);
        self
    }

    /// Attach the resource snapshots the guard copies into the audit entry.
    pub fn with_changes(self, changes: AuditChanges) -> Response {
        (Extension(changes), Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
