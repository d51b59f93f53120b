//! Server-side session storage.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use staffgate_access::{PrincipalRef, Session};
use staffgate_common_core::SessionId;

/// Persistence for session values.
///
/// Transitions are computed on [`Session`] values; the store only swaps them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live session by id. Expired sessions are absent.
    async fn get(&self, id: SessionId) -> Option<Session>;

    /// Insert or overwrite a session.
    async fn insert(&self, session: Session);

    /// Replace `current` with `next` only if the stored value still equals
    /// `current`. Returns whether the swap happened.
    async fn replace(&self, current: &Session, next: Session) -> bool;

    async fn remove(&self, id: SessionId) -> Option<Session>;
}

struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, StoredSession>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Open a fresh session for `principal`.
    pub fn open(&self, principal: PrincipalRef) -> Session {
        let session = Session::new(principal);
        self.put(session.clone());
        session
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| stored.expires_at > now);
        before - self.sessions.len()
    }

    fn put(&self, session: Session) {
        let expires_at = Utc::now() + self.ttl;
        self.sessions.insert(session.id, StoredSession { session, expires_at });
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: SessionId) -> Option<Session> {
        let stored = self.sessions.get(&id)?;
        if stored.expires_at <= Utc::now() {
            drop(stored);
            self.sessions.remove(&id);
            return None;
        }
        Some(stored.session.clone())
    }

    async fn insert(&self, session: Session) {
        self.put(session);
    }

    async fn replace(&self, current: &Session, next: Session) -> bool {
        match self.sessions.get_mut(&current.id) {
            Some(mut stored) if stored.session == *current && stored.expires_at > Utc::now() => {
                stored.session = next;
                true
            }
            _ => false,
        }
    }

    async fn remove(&self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id).map(|(_, stored)| stored.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgate_access::PrincipalKind;
    use staffgate_common_core::PrincipalId;

    fn principal() -> PrincipalRef {
        PrincipalRef::new(PrincipalId::new(), PrincipalKind::User)
    }

    #[tokio::test]
    async fn test_open_and_get() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let session = store.open(principal());

        assert_eq!(store.get(session.id).await, Some(session.clone()));
        assert_eq!(store.remove(session.id).await, Some(session.clone()));
        assert!(store.get(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_absent() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        let session = store.open(principal());

        assert!(store.get(session.id).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_replace_is_conditional() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let session = store.open(principal());
        let mut changed = session.clone();
        changed.principal = principal();

        assert!(store.replace(&session, changed.clone()).await);
        // The stored value moved on, so a stale swap fails.
        assert!(!store.replace(&session, session.clone()).await);
        assert_eq!(store.get(session.id).await, Some(changed));
    }

    #[test]
    fn test_purge_expired() {
        let store = InMemorySessionStore::new(Duration::seconds(-1));
        store.open(principal());
        store.open(principal());
        assert_eq!(store.purge_expired(), 2);
    }

    #[test]
    fn test_insert_overwrites() {
        let store = InMemorySessionStore::new(Duration::hours(1));
        let session = store.open(principal());
        let mut next = session.clone();
        next.principal = principal();

        tokio_test::block_on(store.insert(next.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(tokio_test::block_on(store.get(session.id)), Some(next));
    }
}
