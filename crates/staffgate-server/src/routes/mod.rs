//! Route configuration for the StaffGate API server.

mod audit;
mod facilities;
mod health;
mod impersonation;

use crate::middleware::guard::{audit as audited, compose, require_auth, require_facility_param, require_permission, PipelineError};
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use staffgate_access::tokens;
use staffgate_audit_types::AuditAction;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Create the application router.
///
/// Fails only if a route declares an invalid stage list.
pub fn create_router(state: AppState) -> Result<Router, PipelineError> {
    let api = Router::new()
        .route(
            "/impersonation/start",
            post(impersonation::start).route_layer(
                compose([require_auth(), audited(AuditAction::ImpersonateStart, "impersonation")])?
                    .layer(state.clone()),
            ),
        )
        .route(
            "/impersonation/quit",
            post(impersonation::quit).route_layer(
                compose([require_auth(), audited(AuditAction::ImpersonateEnd, "impersonation")])?
                    .layer(state.clone()),
            ),
        )
        .route(
            "/audit",
            get(audit::list).route_layer(compose([require_auth(), require_permission(tokens::AUDIT_VIEW)])?.layer(state.clone())),
        )
        .route(
            "/facilities",
            get(facilities::list)
                .route_layer(compose([require_auth(), require_permission(tokens::FACILITIES_VIEW)])?.layer(state.clone())),
        )
        .route(
            "/facilities/:facility_id",
            put(facilities::update).route_layer(
                compose([
                    require_auth(),
                    require_permission(tokens::FACILITIES_UPDATE),
                    require_facility_param("facility_id"),
                    audited(AuditAction::Update, "facilities"),
                ])?
                .layer(state.clone()),
            ),
        );

    let common_middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    Ok(Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health::health))
        .fallback(fallback_handler)
        .layer(common_middleware)
        .with_state(state))
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "success": false,
            "error": {
                "code": "not_found",
                "message": "The requested resource was not found"
            }
        })),
    )
}
