//! Impersonation control.
//!
//! Both routes compute the next session value from the one loaded for this
//! request and swap it in only if nothing changed in between.

use crate::error::{ApiError, ApiResult};
use crate::middleware::Auth;
use crate::request::{StartImpersonationRequest, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, response::Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use staffgate_access::{tokens, ImpersonationError, PrincipalRef, QuitOutcome};
use staffgate_audit_capture::AuditChanges;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonationView {
    target_user_id: String,
    target_user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    started_at: Option<DateTime<Utc>>,
}

impl ImpersonationView {
    fn new(target: PrincipalRef, display_name: Option<String>, started_at: Option<DateTime<Utc>>) -> Self {
        Self {
            target_user_id: target.id.to_string(),
            target_user_type: target.kind.to_string(),
            display_name,
            started_at,
        }
    }
}

/// `POST /api/v1/impersonation/start`
pub async fn start(
    State(state): State<AppState>,
    Auth(auth): Auth,
    ValidatedJson(body): ValidatedJson<StartImpersonationRequest>,
) -> ApiResult<Response> {
    let target_ref = body.target()?;
    let session = state.sessions.get(auth.session_id).await.ok_or(ApiError::Unauthorized)?;

    let target = match state.directory.load(&target_ref).await? {
        Some(target) => target,
        // Keep the caller-side checks ahead of the existence check.
        None if auth.is_impersonating() => return Err(ImpersonationError::AlreadyImpersonating.into()),
        None if !state
            .catalog
            .role_has_permission(&auth.effective().role, &tokens::ADMIN_IMPERSONATE) =>
        {
            return Err(ImpersonationError::NotPermitted.into())
        }
        None => return Err(ImpersonationError::TargetUnavailable.into()),
    };

    let next = session.start_impersonation(&auth.identity, &state.catalog, &target, Utc::now())?;
    if !state.sessions.replace(&session, next.clone()).await {
        return Err(ApiError::Conflict("session changed while starting impersonation".into()));
    }

    info!(
        session_id = %session.id,
        actor_id = %auth.effective().id,
        target_id = %target.id,
        "impersonation started"
    );

    let view = ImpersonationView::new(
        target.reference(),
        Some(target.display_name.clone()),
        next.impersonation_started_at(),
    );
    let changes = AuditChanges::new().resource_id(target.id).after(&view);
    Ok(ApiResponse::success(view)
        .with_request_id(auth.request_id)
        .with_changes(changes))
}

/// `POST /api/v1/impersonation/quit`. A no-op success when nothing is being
/// impersonated.
pub async fn quit(State(state): State<AppState>, Auth(auth): Auth) -> ApiResult<Response> {
    let session = state.sessions.get(auth.session_id).await.ok_or(ApiError::Unauthorized)?;

    match session.quit_impersonation() {
        QuitOutcome::Ended { session: next, target } => {
            if !state.sessions.replace(&session, next).await {
                return Err(ApiError::Conflict("session changed while ending impersonation".into()));
            }

            info!(session_id = %session.id, target_id = %target.id, "impersonation ended");

            let view = ImpersonationView::new(target, None, session.impersonation_started_at());
            let changes = AuditChanges::new().resource_id(target.id).before(&view);
            Ok(ApiResponse::success(serde_json::json!({ "ended": true, "impersonation": view }))
                .with_request_id(auth.request_id)
                .with_changes(changes))
        }
        QuitOutcome::NotImpersonating => Ok(ApiResponse::success(serde_json::json!({ "ended": false }))
            .with_request_id(auth.request_id)
            .with_changes(AuditChanges::new())),
    }
}
