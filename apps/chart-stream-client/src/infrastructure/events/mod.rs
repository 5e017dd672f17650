//! Session Event Bus
//!
//! Named observer channels for one chart session, plus a catch-all channel
//! receiving every emission as a `(channel, payload)` pair.
//!
//! # Ordering
//!
//! Observers are synchronous boxed closures invoked in registration order.
//! The only cross-channel guarantee is that a channel's own observers run
//! before the catch-all observers for the same emission; the session core is
//! single-threaded, so no further ordering questions arise.

use crate::application::ports::DiagnosticSink;
use crate::domain::errors::ChartError;

// =============================================================================
// Events
// =============================================================================

/// A session event as seen by the catch-all channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartEvent {
    /// A symbol finished resolving; market metadata is available.
    SymbolLoaded,

    /// A data-bearing packet was fully applied (one emission per packet,
    /// however many sub-feed entries it carried).
    Update,

    /// An error was reported on the error channel.
    Error(ChartError),
}

impl ChartEvent {
    /// The originating channel's name.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::SymbolLoaded => "symbolLoaded",
            Self::Update => "update",
            Self::Error(_) => "error",
        }
    }
}

// =============================================================================
// Event Bus
// =============================================================================

type Observer = Box<dyn FnMut() + Send>;
type ErrorObserver = Box<dyn FnMut(&ChartError) + Send>;
type CatchAllObserver = Box<dyn FnMut(&ChartEvent) + Send>;

/// Observer channels for one chart session.
///
/// Multiple observers per channel are permitted. Error emissions with no
/// error observer fall back to the session's diagnostic sink instead of
/// being dropped; the catch-all channel is not consulted for that fallback.
#[derive(Default)]
pub struct EventBus {
    symbol_loaded: Vec<Observer>,
    update: Vec<Observer>,
    error: Vec<ErrorObserver>,
    catch_all: Vec<CatchAllObserver>,
}

impl EventBus {
    /// Create a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for `symbolLoaded`.
    pub fn on_symbol_loaded(&mut self, observer: impl FnMut() + Send + 'static) {
        self.symbol_loaded.push(Box::new(observer));
    }

    /// Register an observer for `update`.
    pub fn on_update(&mut self, observer: impl FnMut() + Send + 'static) {
        self.update.push(Box::new(observer));
    }

    /// Register an observer for the error channel.
    pub fn on_error(&mut self, observer: impl FnMut(&ChartError) + Send + 'static) {
        self.error.push(Box::new(observer));
    }

    /// Register a catch-all observer receiving every emission.
    pub fn on_event(&mut self, observer: impl FnMut(&ChartEvent) + Send + 'static) {
        self.catch_all.push(Box::new(observer));
    }

    /// Emit `symbolLoaded` (no payload).
    pub fn emit_symbol_loaded(&mut self) {
        for observer in &mut self.symbol_loaded {
            observer();
        }
        let event = ChartEvent::SymbolLoaded;
        for observer in &mut self.catch_all {
            observer(&event);
        }
    }

    /// Emit `update` (no payload).
    pub fn emit_update(&mut self) {
        for observer in &mut self.update {
            observer();
        }
        let event = ChartEvent::Update;
        for observer in &mut self.catch_all {
            observer(&event);
        }
    }

    /// Emit an error, or report it to `fallback` when the error channel has
    /// no observers.
    pub fn emit_error(&mut self, error: ChartError, fallback: &dyn DiagnosticSink) {
        if self.error.is_empty() {
            fallback.report(&error);
            return;
        }

        for observer in &mut self.error {
            observer(&error);
        }
        let event = ChartEvent::Error(error);
        for observer in &mut self.catch_all {
            observer(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("symbol_loaded_observers", &self.symbol_loaded.len())
            .field("update_observers", &self.update.len())
            .field("error_observers", &self.error.len())
            .field("catch_all_observers", &self.catch_all.len())
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

    use super::*;

    #[derive(Default)]
    struct RecordingDiagnostics {
        reports: Mutex<Vec<ChartError>>,
    }

    impl DiagnosticSink for Arc<RecordingDiagnostics> {
        fn report(&self, error: &ChartError) {
            self.reports.lock().push(error.clone());
        }
    }

    #[test]
    fn named_observers_fire_in_registration_order() {
        let mut bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        bus.on_update(move || o1.lock().push(1));
        let o2 = Arc::clone(&order);
        bus.on_update(move || o2.lock().push(2));

        bus.emit_update();

        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn catch_all_runs_after_named_observers() {
        let mut bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        bus.on_event(move |event| o1.lock().push(format!("event:{}", event.channel())));
        let o2 = Arc::clone(&order);
        bus.on_symbol_loaded(move || o2.lock().push("named".to_string()));

        bus.emit_symbol_loaded();

        assert_eq!(*order.lock(), vec!["named", "event:symbolLoaded"]);
    }

    #[test]
    fn catch_all_fires_once_per_emission_regardless_of_named_count() {
        let mut bus = EventBus::new();
        let named = Arc::new(Mutex::new(0));
        let all = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let n = Arc::clone(&named);
            bus.on_update(move || *n.lock() += 1);
        }
        let a = Arc::clone(&all);
        bus.on_event(move |_| *a.lock() += 1);

        bus.emit_update();

        assert_eq!(*named.lock(), 3);
        assert_eq!(*all.lock(), 1);
    }

    #[test]
    fn error_with_observer_skips_fallback() {
        let mut bus = EventBus::new();
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        bus.on_error(move |error| s.lock().push(error.clone()));

        bus.emit_error(ChartError::MarketNotSet, &Arc::clone(&diagnostics));

        assert_eq!(*seen.lock(), vec![ChartError::MarketNotSet]);
        assert!(diagnostics.reports.lock().is_empty());
    }

    #[test]
    fn error_without_observer_goes_to_fallback_not_catch_all() {
        let mut bus = EventBus::new();
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let catch_all_hits = Arc::new(Mutex::new(0));

        let c = Arc::clone(&catch_all_hits);
        bus.on_event(move |_| *c.lock() += 1);

        bus.emit_error(ChartError::MarketNotSet, &Arc::clone(&diagnostics));

        assert_eq!(*diagnostics.reports.lock(), vec![ChartError::MarketNotSet]);
        assert_eq!(*catch_all_hits.lock(), 0);
    }

    #[test]
    fn error_event_carries_payload_to_catch_all() {
        let mut bus = EventBus::new();
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.on_error(|_| {});
        let s = Arc::clone(&seen);
        bus.on_event(move |event| s.lock().push(event.clone()));

        bus.emit_error(
            ChartError::Series {
                message: "bad framing".to_string(),
            },
            &Arc::clone(&diagnostics),
        );

        assert_eq!(
            *seen.lock(),
            vec![ChartEvent::Error(ChartError::Series {
                message: "bad framing".to_string(),
            })]
        );
    }
}
