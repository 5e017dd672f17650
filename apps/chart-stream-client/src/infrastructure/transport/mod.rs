//! Shared Transport
//!
//! One WebSocket connection multiplexes many chart sessions. The session
//! table routes each inbound packet to the session named by its first
//! positional argument; the WebSocket adapter owns the socket itself and
//! feeds the table from its read loop.

pub mod websocket;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::infrastructure::protocol::InboundPacket;

pub use websocket::{TransportError, WebSocketSink, WebSocketTransport};

// =============================================================================
// Packet Handler
// =============================================================================

/// A session capable of consuming inbound packets addressed to it.
pub trait PacketHandler: Send {
    /// Apply one inbound packet to the session's state.
    fn handle_packet(&mut self, packet: InboundPacket);
}

// =============================================================================
// Session Table
// =============================================================================

/// Routing table from session identifier to live session.
///
/// Cloning is cheap; all clones share the same underlying table.
#[derive(Clone, Default)]
pub struct SessionTable {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<dyn PacketHandler>>>>>,
}

impl SessionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `session_id`, replacing any previous entry.
    pub fn register(&self, session_id: impl Into<String>, handler: Arc<Mutex<dyn PacketHandler>>) {
        self.sessions.write().insert(session_id.into(), handler);
    }

    /// Remove the entry for `session_id`, returning whether one existed.
    pub fn unregister(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    /// Route `packet` to the session named by its first positional argument.
    ///
    /// Returns `false` when the packet carries no session identifier or no
    /// session is registered under it; such packets are dropped by the
    /// caller (typically with a trace log), matching the tolerance the rest
    /// of the protocol layer applies to unrecognized traffic.
    pub fn dispatch(&self, packet: InboundPacket) -> bool {
        let Some(session_id) = packet.session_id().map(str::to_owned) else {
            return false;
        };
        let handler = self.sessions.read().get(&session_id).cloned();
        match handler {
            Some(handler) => {
                handler.lock().handle_packet(packet);
                true
            }
            None => false,
        }
    }

    /// Whether a session is registered under `session_id`.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl std::fmt::Debug for SessionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTable")
            .field("sessions", &self.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
