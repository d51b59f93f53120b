//! Shared application state.

use crate::facility::FacilityStore;
use crate::middleware::SessionCarrier;
use crate::session::SessionStore;
use staffgate_access::{AccessGate, FacilityScope, PermissionCatalog, PrincipalDirectory, SessionIdentity};
use staffgate_audit_capture::AuditRecorder;
use staffgate_audit_search::AuditQuery;
use std::sync::Arc;

/// Everything a guarded route or handler reaches for.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<PermissionCatalog>,
    pub directory: Arc<dyn PrincipalDirectory>,
    pub identity: Arc<SessionIdentity>,
    pub scope: Arc<FacilityScope>,
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<dyn SessionStore>,
    pub carrier: SessionCarrier,
    pub facilities: Arc<FacilityStore>,
    pub recorder: AuditRecorder,
    pub audit: Arc<dyn AuditQuery>,
    /// Whether `x-forwarded-for` names the client.
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Wire the access components over the given backends.
    pub fn new(
        catalog: Arc<PermissionCatalog>,
        directory: Arc<dyn PrincipalDirectory>,
        sessions: Arc<dyn SessionStore>,
        carrier: SessionCarrier,
        facilities: Arc<FacilityStore>,
        recorder: AuditRecorder,
        audit: Arc<dyn AuditQuery>,
    ) -> Self {
        Self {
            identity: Arc::new(SessionIdentity::new(directory.clone(), catalog.clone())),
            scope: Arc::new(FacilityScope::new(facilities.clone())),
            gate: Arc::new(AccessGate::new(catalog.clone())),
            catalog,
            directory,
            sessions,
            carrier,
            facilities,
            recorder,
            audit,
            trust_forwarded_for: false,
        }
    }

    pub fn with_trusted_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}
