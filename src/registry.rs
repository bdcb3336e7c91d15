//! Registry of live sessions.
//!
//! `SessionRegistry` maps each [`SessionId`] to the cancellation token of its
//! coordinator, so sessions can be listed and closed from outside their own
//! task. Entries are inserted when a connection is accepted and removed when
//! its task ends.
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::assembler::SessionId;

/// Concurrent registry of session shutdown tokens keyed by [`SessionId`].
#[derive(Debug, Default)]
pub struct SessionRegistry(DashMap<SessionId, CancellationToken>);

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register the token for a newly opened session.
    pub fn insert(&self, id: SessionId, token: CancellationToken) { self.0.insert(id, token); }

    /// Remove a session, typically on teardown.
    pub fn remove(&self, id: &SessionId) { self.0.remove(id); }

    /// Whether `id` is still registered.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool { self.0.contains_key(id) }

    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Return the IDs of the registered sessions, sorted ascending.
    #[must_use]
    pub fn active_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.0.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Cancel the session `id`. Returns `false` if it is not registered.
    ///
    /// The entry stays until the session's task removes it.
    pub fn close(&self, id: &SessionId) -> bool {
        let token = self.0.get(id).map(|entry| entry.value().clone());
        token.is_some_and(|token| {
            token.cancel();
            true
        })
    }

    /// Cancel every registered session.
    pub fn close_all(&self) {
        for entry in &self.0 {
            entry.value().cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn close_cancels_only_the_named_session() {
        let registry = SessionRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        registry.insert(SessionId::new(1), first.clone());
        registry.insert(SessionId::new(2), second.clone());

        assert!(registry.close(&SessionId::new(1)));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!registry.close(&SessionId::new(3)));
    }

    #[rstest]
    fn remove_drops_the_entry() {
        let registry = SessionRegistry::new();
        registry.insert(SessionId::new(5), CancellationToken::new());
        registry.insert(SessionId::new(4), CancellationToken::new());
        assert_eq!(registry.active_ids(), [SessionId::new(4), SessionId::new(5)]);

        registry.remove(&SessionId::new(5));
        assert!(!registry.contains(&SessionId::new(5)));
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn close_all_cancels_everything() {
        let registry = SessionRegistry::new();
        let tokens: Vec<_> = (0..3).map(|_| CancellationToken::new()).collect();
        for (id, token) in tokens.iter().enumerate() {
            registry.insert(SessionId::new(id as u64), token.clone());
        }
        registry.close_all();
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
    }
}
