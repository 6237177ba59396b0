// Session store: token plus minimal profile, written only by the auth
// flow, read by every authenticated request. Injectable so hosts can back
// it with whatever storage they have; the in-memory implementation is the
// default. Token and profile are stored and cleared together.

use std::sync::RwLock;

use crate::wallet::types::UserProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<Session>;
    fn set(&self, session: Session);
    fn clear(&self);

    fn token(&self) -> Option<String> {
        self.get().map(|s| s.token)
    }

    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.inner.read().expect("session lock poisoned").clone()
    }

    fn set(&self, session: Session) {
        *self.inner.write().expect("session lock poisoned") = Some(session);
    }

    fn clear(&self) {
        *self.inner.write().expect("session lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            token: "tok_abc".to_string(),
            profile: UserProfile {
                id: "u1".to_string(),
                name: "Budi".to_string(),
                email: "budi@example.com".to_string(),
                phone_number: "+628123456789".to_string(),
            },
        }
    }

    #[test]
    fn set_get_clear_roundtrip() {
        let store = InMemorySessionStore::new();
        assert!(store.get().is_none());
        assert!(!store.is_authenticated());

        store.set(session());
        assert_eq!(store.token().as_deref(), Some("tok_abc"));
        assert!(store.is_authenticated());

        store.clear();
        assert!(store.get().is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn logout_clears_token_and_profile_together() {
        let store = InMemorySessionStore::new();
        store.set(session());
        store.clear();
        assert!(store.get().is_none());
    }
}
