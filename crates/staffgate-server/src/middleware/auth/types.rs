//! Bearer token claims.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use staffgate_common_core::{PrincipalId, SessionId};
use uuid::Uuid;

/// JWT claims naming a server-side session.
///
/// The token carries no authority of its own; the session it names is
/// looked up on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Principal that authenticated.
    pub sub: PrincipalId,
    /// Session id.
    pub sid: SessionId,
    pub iat: i64,
    pub exp: i64,
    /// Token id.
    pub jti: String,
}

impl SessionClaims {
    pub fn new(principal: PrincipalId, session: SessionId, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: principal,
            sid: session,
            iat: now,
            exp: now + expires_in,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}
