//! In-process harness driving the router with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use staffgate_access::{InMemoryDirectory, PermissionCatalog, Principal, Session};
use staffgate_audit_capture::{AuditRecorder, CaptureConfig};
use staffgate_audit_search::InMemoryAuditStore;
use staffgate_audit_types::AuditEntry;
use staffgate_server::facility::{Facility, FacilityStore};
use staffgate_server::middleware::{SessionCarrier, SessionClaims, TokenDecoder};
use staffgate_server::routes::create_router;
use staffgate_server::session::{InMemorySessionStore, SessionStore};
use staffgate_server::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration_secret_integration_secret";

pub struct Harness {
    pub router: Router,
    pub state: AppState,
    pub directory: Arc<InMemoryDirectory>,
    pub sessions: Arc<InMemorySessionStore>,
    pub facilities: Arc<FacilityStore>,
    pub audit: Arc<InMemoryAuditStore>,
    pub tokens: TokenDecoder,
}

impl Harness {
    /// Router over the built-in catalog with facilities `ids`.
    pub fn new(ids: &[i64]) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let sessions = Arc::new(InMemorySessionStore::new(Duration::hours(1)));
        let facilities = Arc::new(FacilityStore::new(
            ids.iter().map(|id| Facility::new(*id, format!("Facility {id}"))),
        ));
        let audit = Arc::new(InMemoryAuditStore::new());
        let (recorder, _writer) = AuditRecorder::spawn(audit.clone(), CaptureConfig::default());
        let tokens = TokenDecoder::new(SECRET);

        let state = AppState::new(
            Arc::new(PermissionCatalog::builtin()),
            directory.clone(),
            sessions.clone(),
            SessionCarrier::new("sid", tokens.clone()),
            facilities.clone(),
            recorder,
            audit.clone(),
        );
        let router = create_router(state.clone()).unwrap();

        Self {
            router,
            state,
            directory,
            sessions,
            facilities,
            audit,
            tokens,
        }
    }

    /// Register `principal` and open a session for them.
    pub fn login(&self, principal: &Principal) -> Session {
        self.directory.upsert(principal.clone());
        self.sessions.open(principal.reference())
    }

    pub fn bearer(&self, session: &Session) -> String {
        let claims = SessionClaims::new(session.principal.id, session.id, 600);
        self.tokens.encode(&claims).unwrap()
    }

    /// Send a request carrying `session` in the `sid` cookie.
    pub async fn call(&self, method: Method, uri: &str, session: &Session, body: Option<Value>) -> (StatusCode, Value) {
        self.send(authed(method, uri, session), body).await
    }

    pub async fn send(&self, request: axum::http::request::Builder, body: Option<Value>) -> (StatusCode, Value) {
        send_to(self.router.clone(), request, body).await
    }
}

/// Request builder carrying `session` in the `sid` cookie.
pub fn authed(method: Method, uri: &str, session: &Session) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("sid={}", session.id))
}

/// Drive `router` with one request and decode the JSON body.
pub async fn send_to(router: Router, mut request: axum::http::request::Builder, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

impl Harness {
    /// Everything written so far, after draining the queue.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.recorder.flush().await.unwrap();
        self.audit.entries()
    }

    pub async fn stored_session(&self, session: &Session) -> Session {
        self.sessions.get(session.id).await.unwrap()
    }
}

/// Impersonation duality on every stored entry.
pub fn assert_duality(entries: &[AuditEntry]) {
    for entry in entries {
        if entry.is_impersonated {
            let original = entry.original_actor_id.expect("impersonated entry without original actor");
            assert_ne!(original, entry.actor_id);
            assert!(entry.impersonation_started_at.is_some());
        } else {
            assert!(entry.original_actor_id.is_none());
            assert!(entry.impersonation_started_at.is_none());
        }
    }
}
