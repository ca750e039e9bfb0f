//! Listener registry
//!
//! Concurrent map from session id to [`Listener`]. Structural changes lock a
//! single shard; the broadcaster iterates a snapshot so fan-out never holds
//! a lock while writing to sockets.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::listener::Listener;
use crate::session::SessionId;

/// Registry of listeners attached to one broadcaster
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: DashMap<SessionId, Arc<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a listener
    ///
    /// Returns `false` and leaves the registry untouched if a listener with
    /// the same id is already present.
    pub fn insert(&self, listener: Arc<Listener>) -> bool {
        match self.listeners.entry(listener.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(listener);
                true
            }
        }
    }

    /// Remove a listener; removing an absent id is a no-op
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Listener>> {
        self.listeners.remove(id).map(|(_, listener)| listener)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.listeners.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listeners registered at this instant
    pub fn snapshot(&self) -> Vec<Arc<Listener>> {
        self.listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Remove and return every listener
    pub fn drain(&self) -> Vec<Arc<Listener>> {
        let ids: Vec<SessionId> = self.listeners.iter().map(|entry| entry.key().clone()).collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn listener(id: &str) -> Arc<Listener> {
        let (writer, _reader) = tokio::io::duplex(64);
        Arc::new(Listener::new(SessionId::from(id), writer, Duration::from_secs(1)))
    }

    #[test]
    fn test_insert_unique() {
        let registry = ListenerRegistry::new();

        assert!(registry.insert(listener("a")));
        assert!(!registry.insert(listener("a")));
        assert!(registry.insert(listener("b")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_idempotent() {
        let registry = ListenerRegistry::new();
        let id = SessionId::from("a");
        registry.insert(listener("a"));

        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ListenerRegistry::new();
        registry.insert(listener("a"));
        registry.insert(listener("b"));

        let snapshot = registry.snapshot();
        registry.remove(&SessionId::from("a"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drain_empties() {
        let registry = ListenerRegistry::new();
        registry.insert(listener("a"));
        registry.insert(listener("b"));
        registry.insert(listener("c"));

        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
        assert!(registry.drain().is_empty());
    }
}
