//! Span helpers shared by the request pipeline and the audit writer.

use tracing::{info_span, Span};

/// Span covering one pass through the authorization pipeline.
///
/// `actor_id` and `original_actor_id` start empty and are recorded once the
/// session identity has been resolved.
pub fn request_span(request_id: &str, permission: &str) -> Span {
    info_span!(
        "request",
        request_id = %request_id,
        permission = %permission,
        actor_id = tracing::field::Empty,
        original_actor_id = tracing::field::Empty,
    )
}

/// Span for a single audit persistence attempt.
pub fn audit_write_span(request_id: &str, attempt: u32) -> Span {
    info_span!("audit_write", request_id = %request_id, attempt)
}

/// Record the resolved actors on the current request span.
pub fn record_actors(span: &Span, actor_id: &str, original_actor_id: Option<&str>) {
    span.record("actor_id", actor_id);
    if let Some(original) = original_actor_id {
        span.record("original_actor_id", original);
    }
}
