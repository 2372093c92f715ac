//! Session registry: live connection → authenticated identity.

use dashmap::{DashMap, mapref::entry::Entry};

use crate::domain::{ConnectionId, Identity, SessionError};

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Identity>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an identity to a freshly authenticated connection.
    ///
    /// A connection is bound exactly once; a second bind is rejected and the
    /// original identity is kept.
    pub fn bind(&self, connection_id: ConnectionId, identity: Identity) -> Result<(), SessionError> {
        match self.sessions.entry(connection_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyBound(connection_id.to_string())),
            Entry::Vacant(entry) => {
                tracing::debug!(
                    "Connection '{}' bound to user '{}'",
                    connection_id,
                    identity.user_id
                );
                entry.insert(identity);
                Ok(())
            }
        }
    }

    /// `None` for connections that never authenticated or are already gone
    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.sessions
            .get(connection_id)
            .map(|identity| identity.value().clone())
    }

    /// Drop the binding. Forgetting an unknown connection is a no-op.
    pub fn forget(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.sessions
            .remove(connection_id)
            .map(|(_, identity)| identity)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    fn identity(name: &str) -> Identity {
        Identity {
            user_id: UserId::generate(),
            email: format!("{}@example.com", name),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_bind_then_identity_of() {
        // テスト項目: bind した接続の identity が取得できる
        // given (前提条件):
        let registry = SessionRegistry::new();
        let connection_id = ConnectionId::generate();
        let alice = identity("alice");

        // when (操作):
        registry.bind(connection_id, alice.clone()).unwrap();

        // then (期待する結果):
        assert_eq!(registry.identity_of(&connection_id), Some(alice));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bind_twice_fails_fast_and_keeps_original() {
        // テスト項目: 同じ接続への 2 回目の bind はエラーになり、最初の identity が残る
        // given (前提条件):
        let registry = SessionRegistry::new();
        let connection_id = ConnectionId::generate();
        let alice = identity("alice");
        registry.bind(connection_id, alice.clone()).unwrap();

        // when (操作):
        let result = registry.bind(connection_id, identity("mallory"));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionError::AlreadyBound(connection_id.to_string()))
        );
        assert_eq!(registry.identity_of(&connection_id), Some(alice));
    }

    #[test]
    fn test_identity_of_unknown_connection_is_none() {
        // テスト項目: 未認証の接続の identity は None
        // given (前提条件):
        let registry = SessionRegistry::new();

        // when (操作):
        let result = registry.identity_of(&ConnectionId::generate());

        // then (期待する結果):
        assert!(result.is_none());
    }

    #[test]
    fn test_forget_is_idempotent() {
        // テスト項目: forget は何度呼んでもエラーにならない（冪等性）
        // given (前提条件):
        let registry = SessionRegistry::new();
        let connection_id = ConnectionId::generate();
        registry.bind(connection_id, identity("alice")).unwrap();

        // when (操作):
        let first = registry.forget(&connection_id);
        let second = registry.forget(&connection_id);
        let never_bound = registry.forget(&ConnectionId::generate());

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(never_bound.is_none());
        assert!(registry.is_empty());
        assert!(registry.identity_of(&connection_id).is_none());
    }
}
