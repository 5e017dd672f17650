//! Chart Session
//!
//! The stateful core of the client: one [`ChartSession`] per server-side
//! chart session, owning the period cache, the resolved market metadata, the
//! study listeners, and the observer channels. The session consumes packets
//! the transport routes to it and issues commands through the shared
//! [`CommandSink`].
//!
//! [`ChartHandle`] is the ergonomic wrapper for async callers: it holds the
//! session behind a mutex, registers it with the routing table on creation
//! and deregisters it on deletion.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tracing::{trace, warn};

use crate::application::ports::{CommandSink, DiagnosticSink, TracingDiagnostics};
use crate::domain::errors::ChartError;
use crate::domain::market::{MarketInfo, MarketOptions, SymbolSpec};
use crate::domain::period::{PeriodCache, PricePeriod};
use crate::infrastructure::events::{ChartEvent, EventBus};
use crate::infrastructure::protocol::{
    ChartMessage, InboundPacket, SeriesUpdate, CMD_CREATE_SERIES, CMD_CREATE_SESSION,
    CMD_DELETE_SESSION, CMD_MODIFY_SERIES, CMD_REQUEST_MORE_DATA, CMD_RESOLVE_SYMBOL,
    CMD_SWITCH_TIMEZONE, PRICE_FEED, SUB_SERIES_ID,
};
use crate::infrastructure::studies::StudyListenerRegistry;
use crate::infrastructure::transport::{PacketHandler, SessionTable};

/// Length of the random tail in a generated session identifier.
const SESSION_ID_TAIL: usize = 12;

/// Timeframe used when a market binding does not specify one.
pub const DEFAULT_TIMEFRAME: &str = "240";

/// Period count used when a market binding does not specify one.
pub const DEFAULT_RANGE: u64 = 100;

/// Generate a fresh session identifier: `prefix`, an underscore, and twelve
/// random alphanumeric characters.
#[must_use]
pub fn generate_session_id(prefix: &str) -> String {
    let tail: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SESSION_ID_TAIL)
        .map(char::from)
        .collect();
    format!("{prefix}_{tail}")
}

// =============================================================================
// Chart Session
// =============================================================================

/// One chart session: market binding, series configuration, period cache and
/// observer channels.
///
/// The session is single-threaded by construction; callers serialize access
/// through [`ChartHandle`] or their own lock. Opening a session sends the
/// create command immediately.
pub struct ChartSession {
    session_id: String,
    sink: Arc<dyn CommandSink>,
    diagnostics: Box<dyn DiagnosticSink>,
    series_counter: u64,
    series_created: bool,
    info: Option<MarketInfo>,
    periods: PeriodCache,
    studies: StudyListenerRegistry,
    events: EventBus,
}

impl ChartSession {
    /// Open a session with the default tracing diagnostics.
    #[must_use]
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self::with_diagnostics(sink, Box::new(TracingDiagnostics))
    }

    /// Open a session reporting unobserved errors to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(sink: Arc<dyn CommandSink>, diagnostics: Box<dyn DiagnosticSink>) -> Self {
        let session_id = generate_session_id("cs");
        sink.send(CMD_CREATE_SESSION, vec![json!(session_id)]);

        Self {
            session_id,
            sink,
            diagnostics,
            series_counter: 0,
            series_created: false,
            info: None,
            periods: PeriodCache::new(),
            studies: StudyListenerRegistry::new(),
            events: EventBus::new(),
        }
    }

    /// The session's wire identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Last-resolved market metadata, if a symbol has resolved.
    #[must_use]
    pub fn market_info(&self) -> Option<&MarketInfo> {
        self.info.as_ref()
    }

    /// Cached periods, newest first.
    #[must_use]
    pub fn periods(&self) -> Vec<PricePeriod> {
        self.periods.snapshot()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Bind the session to `symbol`, resolving it under a fresh series
    /// identity and (re)configuring the price series.
    ///
    /// Clears the period cache and drops the previous market metadata; data
    /// from the old binding never leaks into the new one.
    pub fn set_market(&mut self, symbol: impl Into<String>, options: MarketOptions) {
        self.periods.clear();
        self.info = None;

        let mut spec = SymbolSpec::new(symbol);
        if let Some(adjustment) = options.adjustment {
            spec.adjustment = adjustment;
        }
        spec.session = options.session;
        spec.currency = options.currency;

        self.series_counter += 1;
        let request = spec.resolve_request(options.style.as_ref());
        let Ok(encoded) = serde_json::to_string(&request) else {
            warn!(session = %self.session_id, "failed to encode resolve request");
            return;
        };
        self.sink.send(
            CMD_RESOLVE_SYMBOL,
            vec![
                json!(self.session_id),
                json!(self.series_label()),
                json!(format!("={encoded}")),
            ],
        );

        let timeframe = options
            .timeframe
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
        self.set_series(
            &timeframe,
            options.range.unwrap_or(DEFAULT_RANGE),
            options.reference,
        );
    }

    /// Configure the price series against the current market binding.
    ///
    /// Requires a prior [`set_market`](Self::set_market); without one this
    /// reports [`ChartError::MarketNotSet`] and sends nothing. The first
    /// configuration creates the series; later calls modify it (the size
    /// slot is only honored on creation, so modifications send it empty).
    pub fn set_series(&mut self, timeframe: &str, range: u64, reference: Option<i64>) {
        if self.series_counter == 0 {
            self.report_error(ChartError::MarketNotSet);
            return;
        }

        self.periods.clear();

        let size = if self.series_created {
            json!("")
        } else if let Some(reference) = reference {
            json!(["bar_count", reference, range])
        } else {
            json!(range)
        };
        let verb = if self.series_created {
            CMD_MODIFY_SERIES
        } else {
            CMD_CREATE_SERIES
        };

        self.sink.send(
            verb,
            vec![
                json!(self.session_id),
                json!(PRICE_FEED),
                json!(SUB_SERIES_ID),
                json!(self.series_label()),
                json!(timeframe),
                size,
            ],
        );
        self.series_created = true;
    }

    /// Switch the session's timezone. Clears the cache; the service resends
    /// periods under the new zone.
    pub fn set_timezone(&mut self, timezone: &str) {
        self.periods.clear();
        self.sink.send(
            CMD_SWITCH_TIMEZONE,
            vec![json!(self.session_id), json!(timezone)],
        );
    }

    /// Request `number` additional older periods on the existing feed. The
    /// cache is kept; backfill extends it.
    pub fn fetch_more(&mut self, number: u64) {
        self.sink.send(
            CMD_REQUEST_MORE_DATA,
            vec![json!(self.session_id), json!(PRICE_FEED), json!(number)],
        );
    }

    /// Close the session server-side. The caller is responsible for removing
    /// the session from the routing table (see [`ChartHandle::delete`]).
    pub fn delete(&mut self) {
        self.sink
            .send(CMD_DELETE_SESSION, vec![json!(self.session_id)]);
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Observe successful symbol resolutions.
    pub fn on_symbol_loaded(&mut self, observer: impl FnMut() + Send + 'static) {
        self.events.on_symbol_loaded(observer);
    }

    /// Observe applied data updates (one notification per data packet).
    pub fn on_update(&mut self, observer: impl FnMut() + Send + 'static) {
        self.events.on_update(observer);
    }

    /// Observe session errors. With no error observer, errors go to the
    /// diagnostic sink instead.
    pub fn on_error(&mut self, observer: impl FnMut(&ChartError) + Send + 'static) {
        self.events.on_error(observer);
    }

    /// Observe every emission as a [`ChartEvent`].
    pub fn on_event(&mut self, observer: impl FnMut(&ChartEvent) + Send + 'static) {
        self.events.on_event(observer);
    }

    /// Register a packet listener for `study_id`, replacing any existing one.
    pub fn register_study_listener(
        &mut self,
        study_id: impl Into<String>,
        listener: impl FnMut(&InboundPacket) + Send + 'static,
    ) {
        self.studies.register(study_id, listener);
    }

    /// Remove the listener for `study_id`, returning whether one existed.
    pub fn remove_study_listener(&mut self, study_id: &str) -> bool {
        self.studies.remove(study_id)
    }

    // =========================================================================
    // Packet handling
    // =========================================================================

    fn series_label(&self) -> String {
        format!("ser_{}", self.series_counter)
    }

    fn report_error(&mut self, error: ChartError) {
        self.events.emit_error(error, self.diagnostics.as_ref());
    }

    fn apply_data_update(&mut self, packet: &InboundPacket, feeds: &serde_json::Map<String, Value>) {
        for (feed, payload) in feeds {
            if feed == PRICE_FEED {
                for record in SeriesUpdate::from_value(payload).records {
                    if let Some(period) = record.period() {
                        self.periods.upsert(period);
                    }
                }
            } else if !self.studies.notify(feed, packet) {
                trace!(session = %self.session_id, %feed, "ignoring unknown sub-feed");
            }
        }
        // One notification per packet, no matter how many records it carried.
        self.events.emit_update();
    }
}

impl PacketHandler for ChartSession {
    fn handle_packet(&mut self, packet: InboundPacket) {
        // Study traffic is addressed by the second argument and takes
        // precedence over kind-based handling.
        if let Some(study_id) = packet.arg_str(1).map(str::to_owned) {
            if self.studies.contains(&study_id) {
                self.studies.notify(&study_id, &packet);
                return;
            }
        }

        match ChartMessage::classify(&packet) {
            ChartMessage::SymbolResolved { info } => {
                self.info = Some(*info);
                self.events.emit_symbol_loaded();
            }
            ChartMessage::DataUpdate { feeds } => self.apply_data_update(&packet, &feeds),
            ChartMessage::SymbolError { series_id, message } => {
                self.report_error(ChartError::Symbol { series_id, message });
            }
            ChartMessage::SeriesError { message } => {
                self.report_error(ChartError::Series { message });
            }
            ChartMessage::CriticalError { name, description } => {
                self.report_error(ChartError::Critical { name, description });
            }
            ChartMessage::Unrecognized { kind } => {
                trace!(session = %self.session_id, %kind, "ignoring unrecognized packet kind");
            }
        }
    }
}

impl std::fmt::Debug for ChartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSession")
            .field("session_id", &self.session_id)
            .field("series_counter", &self.series_counter)
            .field("series_created", &self.series_created)
            .field("periods", &self.periods.len())
            .finish()
    }
}

// =============================================================================
// Chart Handle
// =============================================================================

/// Shared handle to a chart session registered with a routing table.
///
/// Cloning yields another handle to the same session. Dropping handles does
/// not close the session; call [`delete`](Self::delete) to close it and
/// remove it from the table.
///
/// Observers run while the session lock is held: an observer that calls back
/// into a handle deadlocks. Forward events through a channel and read session
/// state from the receiving side instead.
#[derive(Clone)]
pub struct ChartHandle {
    session: Arc<Mutex<ChartSession>>,
    sessions: SessionTable,
    session_id: String,
}

impl ChartHandle {
    /// Open a session on `sink` and register it for packet routing.
    #[must_use]
    pub fn create(sink: Arc<dyn CommandSink>, sessions: &SessionTable) -> Self {
        let session = ChartSession::new(sink);
        let session_id = session.session_id().to_string();
        let session = Arc::new(Mutex::new(session));
        sessions.register(session_id.clone(), session.clone());

        Self {
            session,
            sessions: sessions.clone(),
            session_id,
        }
    }

    /// The session's wire identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run `f` against the locked session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut ChartSession) -> R) -> R {
        f(&mut self.session.lock())
    }

    /// Bind the session to a market. See [`ChartSession::set_market`].
    pub fn set_market(&self, symbol: impl Into<String>, options: MarketOptions) {
        self.session.lock().set_market(symbol, options);
    }

    /// Reconfigure the price series. See [`ChartSession::set_series`].
    pub fn set_series(&self, timeframe: &str, range: u64, reference: Option<i64>) {
        self.session.lock().set_series(timeframe, range, reference);
    }

    /// Switch the session timezone.
    pub fn set_timezone(&self, timezone: &str) {
        self.session.lock().set_timezone(timezone);
    }

    /// Request additional older periods.
    pub fn fetch_more(&self, number: u64) {
        self.session.lock().fetch_more(number);
    }

    /// Cached periods, newest first.
    #[must_use]
    pub fn periods(&self) -> Vec<PricePeriod> {
        self.session.lock().periods()
    }

    /// Last-resolved market metadata, cloned out of the session.
    #[must_use]
    pub fn market_info(&self) -> Option<MarketInfo> {
        self.session.lock().market_info().cloned()
    }

    /// Observe successful symbol resolutions.
    pub fn on_symbol_loaded(&self, observer: impl FnMut() + Send + 'static) {
        self.session.lock().on_symbol_loaded(observer);
    }

    /// Observe applied data updates.
    pub fn on_update(&self, observer: impl FnMut() + Send + 'static) {
        self.session.lock().on_update(observer);
    }

    /// Observe session errors.
    pub fn on_error(&self, observer: impl FnMut(&ChartError) + Send + 'static) {
        self.session.lock().on_error(observer);
    }

    /// Observe every emission as a [`ChartEvent`].
    pub fn on_event(&self, observer: impl FnMut(&ChartEvent) + Send + 'static) {
        self.session.lock().on_event(observer);
    }

    /// Register a packet listener for `study_id`.
    pub fn register_study_listener(
        &self,
        study_id: impl Into<String>,
        listener: impl FnMut(&InboundPacket) + Send + 'static,
    ) {
        self.session.lock().register_study_listener(study_id, listener);
    }

    /// Remove the listener for `study_id`, returning whether one existed.
    pub fn remove_study_listener(&self, study_id: &str) -> bool {
        self.session.lock().remove_study_listener(study_id)
    }

    /// Close the session and stop routing packets to it.
    pub fn delete(self) {
        self.session.lock().delete();
        self.sessions.unregister(&self.session_id);
    }
}

impl std::fmt::Debug for ChartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartHandle")
            .field("session_id", &self.session_id)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
