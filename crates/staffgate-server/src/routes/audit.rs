use crate::error::{ApiError, ApiResult};
use crate::middleware::Auth;
use crate::request::AuditListParams;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::{rejection::QueryRejection, Query, State};
use staffgate_audit_types::AuditPage;

/// `GET /api/v1/audit`
pub async fn list(
    State(state): State<AppState>,
    Auth(auth): Auth,
    params: Result<Query<AuditListParams>, QueryRejection>,
) -> ApiResult<ApiResponse<AuditPage>> {
    let Query(params) = params.map_err(|rejection| ApiError::InvalidQueryParam(rejection.body_text()))?;
    let (filter, page) = params.into_query()?;

    let page = state.audit.list_audit_entries(&filter, page).await?;
    Ok(ApiResponse::success(page).with_request_id(auth.request_id))
}
