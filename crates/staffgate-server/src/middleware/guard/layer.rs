//! Tower layer running a [`Pipeline`] around a route.

use super::pipeline::{AuditSpec, Pipeline};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, RawPathParams},
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
};
use staffgate_access::{AuthContext, ClientInfo, Decision, Permission};
use staffgate_audit_capture::{AuditChanges, AuditContext, AuditOutcome, AuditRecorder};
use staffgate_common_core::{FacilityId, RequestId};
use staffgate_common_log::spans::{record_actors, request_span};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{error, info, warn, Instrument, Span};

#[derive(Clone)]
pub struct GuardLayer {
    pipeline: Arc<Pipeline>,
    state: AppState,
}

impl GuardLayer {
    pub fn new(pipeline: Arc<Pipeline>, state: AppState) -> Self {
        Self { pipeline, state }
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            pipeline: self.pipeline.clone(),
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GuardMiddleware<S> {
    inner: S,
    pipeline: Arc<Pipeline>,
    state: AppState,
}

impl<S> Service<Request<Body>> for GuardMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let pipeline = self.pipeline.clone();
        let state = self.state.clone();
        let inner = self.inner.clone();

        let request_id = RequestId::new();
        let span = request_span(&request_id.to_string(), pipeline.permission_label());

        Box::pin(async move { Ok(run(pipeline, state, inner, request_id, req).await) }.instrument(span))
    }
}

async fn run<S>(pipeline: Arc<Pipeline>, state: AppState, inner: S, request_id: RequestId, req: Request<Body>) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
    S::Future: Send + 'static,
{
    let (mut parts, body) = req.into_parts();

    let context = match admit(&pipeline, &state, request_id, &mut parts).await {
        Ok(context) => context,
        Err(err) => return err.into_response(),
    };
    parts.extensions.insert(context.clone());
    let req = Request::from_parts(parts, body);

    // The handler and the audit write run detached so that a dropped
    // connection cannot cancel either of them.
    let span = Span::current();
    let recorder = state.recorder.clone();
    let completion = tokio::spawn(
        async move {
            let response = call_handler(inner, req).await;
            if let Some(spec) = &pipeline.audit {
                record(&recorder, &context, spec, pipeline.permission.clone(), &response);
            }
            response
        }
        .instrument(span),
    );

    match completion.await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "request task failed");
            ApiError::Internal(anyhow::anyhow!("request task failed")).into_response()
        }
    }
}

/// Authenticate, resolve, validate the facility param and consult the gate.
async fn admit(
    pipeline: &Pipeline,
    state: &AppState,
    request_id: RequestId,
    parts: &mut Parts,
) -> Result<AuthContext, ApiError> {
    let session_id = state.carrier.session_id(&parts.headers)?;
    let session = state.sessions.get(session_id).await.ok_or(ApiError::Unauthorized)?;

    let identity = match state.identity.resolve(&session).await {
        Ok(identity) => identity,
        Err(err) => {
            if session.is_impersonating() && err.clears_impersonation() {
                state.sessions.replace(&session, session.clear_impersonation()).await;
                warn!(session_id = %session.id, error = %err, "impersonation cleared");
            } else {
                warn!(session_id = %session.id, error = %err, "identity resolution failed");
            }
            return Err(err.into());
        }
    };

    let original_id = identity.original.as_ref().map(|p| p.id.to_string());
    record_actors(&Span::current(), &identity.effective.id.to_string(), original_id.as_deref());

    let facility_id = match &pipeline.facility_param {
        Some(name) => Some(facility_param(parts, name).await?),
        None => None,
    };

    let scope = state.scope.scope_for(&identity.effective).await?;

    if let Some(permission) = &pipeline.permission {
        if let Decision::Deny(reason) = state.gate.authorize(&identity.effective, &scope, permission, facility_id) {
            warn!(
                principal_id = %identity.effective.id,
                role = %identity.effective.role,
                permission = %permission,
                facility_id = ?facility_id,
                reason = %reason,
                "authorization denied"
            );
            return Err(ApiError::Forbidden);
        }
    }

    Ok(AuthContext {
        request_id,
        session_id: session.id,
        identity,
        scope,
        facility_id,
        client: client_info(parts, state.trust_forwarded_for),
    })
}

async fn facility_param(parts: &mut Parts, name: &str) -> Result<FacilityId, ApiError> {
    let params = RawPathParams::from_request_parts(parts, &())
        .await
        .map_err(|_| ApiError::BadRequest(format!("missing path parameter '{name}'")))?;

    let raw = params
        .iter()
        .find_map(|(key, value)| (key == name).then_some(value))
        .ok_or_else(|| ApiError::BadRequest(format!("missing path parameter '{name}'")))?;

    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid facility id '{raw}'")))
}

/// Client address and agent for the audit entry. `x-forwarded-for` is only
/// consulted when the deployment says a proxy sets it.
fn client_info(parts: &Parts, trust_forwarded_for: bool) -> ClientInfo {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .filter(|_| trust_forwarded_for)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    ClientInfo {
        ip: forwarded.or(peer),
        user_agent: parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Run the handler on its own task so a panic still yields a response to
/// audit.
async fn call_handler<S>(mut inner: S, req: Request<Body>) -> Response
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
    S::Future: Send + 'static,
{
    let handler = tokio::spawn(inner.call(req).in_current_span());
    match handler.await {
        Ok(Ok(response)) => response,
        Ok(Err(never)) => match never {},
        Err(err) => {
            error!(error = %err, "handler panicked");
            ApiError::Internal(anyhow::anyhow!("handler panicked")).into_response()
        }
    }
}

fn record(
    recorder: &AuditRecorder,
    context: &AuthContext,
    spec: &AuditSpec,
    permission: Option<Permission>,
    response: &Response,
) {
    let changes = response.extensions().get::<AuditChanges>().cloned().unwrap_or_default();
    let outcome = AuditOutcome::from_status(response.status().as_u16());

    if spec.action.is_impersonation_control() {
        info!(
            request_id = %context.request_id,
            action = %spec.action,
            success = outcome.is_success(),
            "impersonation control recorded"
        );
    }

    match AuditContext::from_auth(context, spec.action.clone(), spec.resource.clone(), permission) {
        Ok(audit) => recorder.record(audit.with_outcome(outcome).with_changes(changes)),
        Err(err) => error!(
            request_id = %context.request_id,
            action = %spec.action,
            error = %err,
            "audit context could not be built"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(forwarded: Option<&str>, peer: Option<&str>) -> Parts {
        let mut builder = Request::builder().header(header::USER_AGENT, "curl/8");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(addr) = peer {
            parts.extensions.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        }
        parts
    }

    #[test]
    fn test_forwarded_header_ignored_by_default() {
        let client = client_info(&parts(Some("203.0.113.9"), Some("10.0.0.2:5000")), false);
        assert_eq!(client.ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(client.user_agent.as_deref(), Some("curl/8"));

        let client = client_info(&parts(Some("203.0.113.9"), None), false);
        assert_eq!(client.ip, None);
    }

    #[test]
    fn test_trusted_forwarded_header_names_first_hop() {
        let client = client_info(&parts(Some("203.0.113.9, 10.0.0.1"), Some("10.0.0.2:5000")), true);
        assert_eq!(client.ip.as_deref(), Some("203.0.113.9"));

        let client = client_info(&parts(Some(" "), Some("10.0.0.2:5000")), true);
        assert_eq!(client.ip.as_deref(), Some("10.0.0.2"));
    }
}
