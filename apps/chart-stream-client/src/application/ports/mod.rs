//! Port Interfaces
//!
//! Contracts between the chart-session core and the systems around it,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`CommandSink`]: fire-and-forget command arrays handed to the transport
//! - [`DiagnosticSink`]: fallback reporter for errors with no observer
//!
//! The inbound contract (`PacketHandler`) lives with the session table in
//! `infrastructure::transport`, next to the registry that dispatches on it.

use serde_json::Value;

use crate::domain::errors::ChartError;

// =============================================================================
// Command Sink
// =============================================================================

/// Outbound command port.
///
/// Every service command is an ordered argument list under a command name,
/// with the session identifier always at position 0. Sends are
/// fire-and-forget: the core never blocks on, retries, or observes delivery —
/// failures are the transport's to log and handle.
pub trait CommandSink: Send + Sync {
    /// Hand a command and its argument array to the transport.
    fn send(&self, command: &str, arguments: Vec<Value>);
}

// =============================================================================
// Diagnostic Sink
// =============================================================================

/// Fallback reporter for chart errors when no error observer is registered.
///
/// Injectable so the no-observer path stays deterministic and testable
/// instead of leaning on ambient global state.
pub trait DiagnosticSink: Send {
    /// Report an error that had no observer to receive it.
    fn report(&self, error: &ChartError);
}

/// Default diagnostic sink: structured error logging through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, error: &ChartError) {
        tracing::error!(error = %error, "unobserved chart session error");
    }
}
