//! Study Listener Registry
//!
//! Per-study packet listeners keyed by study identifier. Packets whose second
//! positional argument matches a registered key are handed to that listener
//! instead of the session's own packet handling.

use std::collections::HashMap;

use crate::infrastructure::protocol::InboundPacket;

type StudyListener = Box<dyn FnMut(&InboundPacket) + Send>;

/// Listeners keyed by study identifier (e.g. `"st1"`, `"st2"`).
///
/// At most one listener per key; registering a key twice replaces the
/// earlier listener.
#[derive(Default)]
pub struct StudyListenerRegistry {
    listeners: HashMap<String, StudyListener>,
}

impl StudyListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `study_id`, replacing any existing one.
    pub fn register(
        &mut self,
        study_id: impl Into<String>,
        listener: impl FnMut(&InboundPacket) + Send + 'static,
    ) {
        self.listeners.insert(study_id.into(), Box::new(listener));
    }

    /// Remove the listener for `study_id`, returning whether one existed.
    pub fn remove(&mut self, study_id: &str) -> bool {
        self.listeners.remove(study_id).is_some()
    }

    /// Whether a listener is registered for `study_id`.
    #[must_use]
    pub fn contains(&self, study_id: &str) -> bool {
        self.listeners.contains_key(study_id)
    }

    /// Deliver `packet` to the listener for `study_id`, returning whether a
    /// listener consumed it.
    pub fn notify(&mut self, study_id: &str, packet: &InboundPacket) -> bool {
        match self.listeners.get_mut(study_id) {
            Some(listener) => {
                listener(packet);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for StudyListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    fn packet(kind: &str) -> InboundPacket {
        serde_json::from_value(json!({ "m": kind, "p": ["cs_test", "st1"] }))
            .expect("valid packet")
    }

    #[test]
    fn notify_delivers_to_registered_listener() {
        let mut registry = StudyListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        registry.register("st1", move |packet| s.lock().push(packet.kind.clone()));

        assert!(registry.notify("st1", &packet("du")));
        assert_eq!(*seen.lock(), vec!["du".to_string()]);
    }

    #[test]
    fn notify_reports_miss_for_unknown_key() {
        let mut registry = StudyListenerRegistry::new();
        assert!(!registry.notify("st9", &packet("du")));
    }

    #[test]
    fn register_replaces_existing_listener() {
        let mut registry = StudyListenerRegistry::new();
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));

        let f = Arc::clone(&first);
        registry.register("st1", move |_| *f.lock() += 1);
        let s = Arc::clone(&second);
        registry.register("st1", move |_| *s.lock() += 1);

        registry.notify("st1", &packet("du"));

        assert_eq!(*first.lock(), 0);
        assert_eq!(*second.lock(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_reports_whether_listener_existed() {
        let mut registry = StudyListenerRegistry::new();
        registry.register("st1", |_| {});

        assert!(registry.remove("st1"));
        assert!(!registry.remove("st1"));
        assert!(registry.is_empty());
    }
}
