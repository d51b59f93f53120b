use crate::error::{ApiError, ApiResult};
use crate::facility::{Facility, FacilityPatch};
use crate::middleware::Auth;
use crate::request::{UpdateFacilityRequest, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, response::Response};
use staffgate_access::filter_by_scope;
use staffgate_audit_capture::AuditChanges;
use tracing::info;

/// `GET /api/v1/facilities`: the caller's facilities only.
pub async fn list(State(state): State<AppState>, Auth(auth): Auth) -> ApiResponse<Vec<Facility>> {
    let visible = filter_by_scope(state.facilities.list(), &auth.scope, |f| Some(f.id));
    ApiResponse::success(visible).with_request_id(auth.request_id)
}

/// `PUT /api/v1/facilities/{facilityId}`
pub async fn update(
    State(state): State<AppState>,
    Auth(auth): Auth,
    ValidatedJson(body): ValidatedJson<UpdateFacilityRequest>,
) -> ApiResult<Response> {
    let facility_id = auth
        .facility_id
        .ok_or_else(|| ApiError::BadRequest("missing facility id".into()))?;

    let patch = FacilityPatch::from(body);
    let (before, after) = state
        .facilities
        .update(facility_id, &patch)
        .ok_or_else(|| ApiError::NotFound("Facility".into()))?;

    info!(facility_id = %facility_id, actor_id = %auth.effective().id, "facility updated");

    let changes = AuditChanges::new().resource_id(facility_id).before(&before).after(&after);
    Ok(ApiResponse::success(after)
        .with_request_id(auth.request_id)
        .with_changes(changes))
}
