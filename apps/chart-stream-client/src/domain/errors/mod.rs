//! Chart Session Error Model
//!
//! All failures surfaced by a chart session travel through the session's
//! error channel rather than as control-flow errors: the service keeps the
//! session alive across symbol and series failures, and even a critical
//! error leaves teardown to the caller.

// =============================================================================
// Chart Error
// =============================================================================

/// An error reported on a chart session's error channel.
///
/// Three severities originate from the service, one locally. None of them
/// terminate the session; `Critical` signals a service-side fatal condition
/// but teardown remains the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    /// Symbol resolution failed. Recoverable; the session stays usable.
    #[error("({series_id}) symbol error: {message}")]
    Symbol {
        /// Series identity the failed resolve was issued under (`ser_N`).
        series_id: String,
        /// Service-provided failure message.
        message: String,
    },

    /// Series creation or modification failed. Recoverable.
    #[error("series error: {message}")]
    Series {
        /// Service-provided failure message.
        message: String,
    },

    /// Service-originated fatal condition. Does not auto-terminate the
    /// session.
    #[error("critical error: {name}: {description}")]
    Critical {
        /// Error name.
        name: String,
        /// Error description.
        description: String,
    },

    /// Local precondition violation: series framing was requested before any
    /// market was set. The requested operation is aborted with no side
    /// effects.
    #[error("market must be set before configuring the series")]
    MarketNotSet,
}
