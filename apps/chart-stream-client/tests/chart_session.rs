//! End-to-end session behavior against a recording command sink.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use chart_stream_client::application::ports::{CommandSink, DiagnosticSink};
use chart_stream_client::domain::market::{ChartStyle, RenkoInputs};
use chart_stream_client::infrastructure::protocol::InboundPacket;
use chart_stream_client::infrastructure::session::{ChartHandle, ChartSession};
use chart_stream_client::infrastructure::transport::{PacketHandler, SessionTable};
use chart_stream_client::{ChartError, ChartEvent, MarketOptions};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Default)]
struct RecordingSink {
    commands: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingSink {
    fn commands(&self) -> Vec<(String, Vec<Value>)> {
        self.commands.lock().clone()
    }

    fn verbs(&self) -> Vec<String> {
        self.commands.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: &str, arguments: Vec<Value>) {
        self.commands.lock().push((command.to_string(), arguments));
    }
}

struct SharedDiagnostics(Arc<Mutex<Vec<ChartError>>>);

impl DiagnosticSink for SharedDiagnostics {
    fn report(&self, error: &ChartError) {
        self.0.lock().push(error.clone());
    }
}

fn session() -> (Arc<RecordingSink>, ChartSession) {
    let sink = Arc::new(RecordingSink::default());
    let session = ChartSession::new(sink.clone());
    (sink, session)
}

fn packet(value: Value) -> InboundPacket {
    serde_json::from_value(value).expect("valid packet")
}

fn price_packet(session_id: &str, records: Value) -> InboundPacket {
    packet(json!({
        "m": "du",
        "p": [session_id, {"$prices": {"s": records}}],
    }))
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[test]
fn opening_a_session_sends_the_create_command() {
    let (sink, session) = session();

    let commands = sink.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].0, "chart_create_session");
    assert_eq!(commands[0].1, vec![json!(session.session_id())]);
    assert!(session.session_id().starts_with("cs_"));
}

#[test]
fn set_market_resolves_then_configures_the_series() {
    let (sink, mut session) = session();
    session.set_market("COINBASE:BTCEUR", MarketOptions::default());

    let commands = sink.commands();
    assert_eq!(
        sink.verbs(),
        vec!["chart_create_session", "resolve_symbol", "create_series"]
    );

    let (_, resolve_args) = &commands[1];
    assert_eq!(resolve_args[0], json!(session.session_id()));
    assert_eq!(resolve_args[1], json!("ser_1"));
    let descriptor = resolve_args[2].as_str().expect("descriptor string");
    assert!(descriptor.starts_with('='));
    let parsed: Value = serde_json::from_str(&descriptor[1..]).expect("descriptor json");
    assert_eq!(parsed["symbol"], "COINBASE:BTCEUR");
    assert_eq!(parsed["adjustment"], "splits");

    let (_, series_args) = &commands[2];
    assert_eq!(
        series_args,
        &vec![
            json!(session.session_id()),
            json!("$prices"),
            json!("s1"),
            json!("ser_1"),
            json!("240"),
            json!(100),
        ]
    );
}

#[test]
fn styled_binding_wraps_the_resolve_descriptor() {
    let (sink, mut session) = session();
    session.set_market(
        "COINBASE:BTCEUR",
        MarketOptions {
            style: Some(ChartStyle::Renko(RenkoInputs {
                style: Some("ATR".to_string()),
                atr_length: Some(14),
                ..RenkoInputs::default()
            })),
            ..MarketOptions::default()
        },
    );

    let commands = sink.commands();
    let descriptor = commands[1].1[2].as_str().expect("descriptor string");
    let parsed: Value = serde_json::from_str(&descriptor[1..]).expect("descriptor json");

    assert_eq!(parsed["symbol"]["symbol"], "COINBASE:BTCEUR");
    assert_eq!(parsed["type"], "BarSetRenko@tv-prostudies-40!");
    assert_eq!(parsed["inputs"]["atrLength"], 14);
}

#[test]
fn series_verb_upgrades_to_modify_after_creation() {
    let (sink, mut session) = session();
    session.set_market("BTCEUR", MarketOptions::default());
    session.set_series("60", 50, None);
    session.set_market("ETHEUR", MarketOptions::default());

    assert_eq!(
        sink.verbs(),
        vec![
            "chart_create_session",
            "resolve_symbol",
            "create_series",
            "modify_series",
            "resolve_symbol",
            "modify_series",
        ]
    );

    // Modifications leave the size slot empty and advance the series label.
    let commands = sink.commands();
    assert_eq!(commands[3].1[3], json!("ser_1"));
    assert_eq!(commands[3].1[5], json!(""));
    assert_eq!(commands[5].1[3], json!("ser_2"));
}

#[test]
fn set_series_before_market_reports_and_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let reports = Arc::new(Mutex::new(Vec::new()));
    let mut session = ChartSession::with_diagnostics(
        sink.clone(),
        Box::new(SharedDiagnostics(reports.clone())),
    );

    session.set_series("60", 50, None);

    assert_eq!(sink.verbs(), vec!["chart_create_session"]);
    assert_eq!(*reports.lock(), vec![ChartError::MarketNotSet]);
}

#[test]
fn reference_timestamp_switches_to_a_bar_count_anchor() {
    let (sink, mut session) = session();
    session.set_market(
        "BTCEUR",
        MarketOptions {
            range: Some(10),
            reference: Some(1_600_000_000),
            ..MarketOptions::default()
        },
    );

    let commands = sink.commands();
    assert_eq!(commands[2].1[5], json!(["bar_count", 1_600_000_000, 10]));
}

#[test]
fn delete_sends_the_close_verb_and_stops_routing() {
    let sink = Arc::new(RecordingSink::default());
    let sessions = SessionTable::new();
    let chart = ChartHandle::create(sink.clone(), &sessions);
    let session_id = chart.session_id().to_string();
    assert!(sessions.contains(&session_id));

    chart.delete();

    assert_eq!(sink.verbs(), vec!["chart_create_session", "chart_delete_session"]);
    assert!(!sessions.contains(&session_id));
    assert!(!sessions.dispatch(price_packet(&session_id, json!([]))));
}

// =============================================================================
// Cache invalidation
// =============================================================================

fn seed_one_period(session: &mut ChartSession) {
    let id = session.session_id().to_string();
    session.handle_packet(price_packet(&id, json!([{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}])));
    assert_eq!(session.periods().len(), 1);
}

#[test]
fn context_switches_clear_the_cache() {
    let (_sink, mut session) = session();
    session.set_market("BTCEUR", MarketOptions::default());

    seed_one_period(&mut session);
    session.set_market("ETHEUR", MarketOptions::default());
    assert!(session.periods().is_empty());

    seed_one_period(&mut session);
    session.set_series("60", 50, None);
    assert!(session.periods().is_empty());

    seed_one_period(&mut session);
    session.set_timezone("Europe/Paris");
    assert!(session.periods().is_empty());
}

#[test]
fn fetch_more_keeps_the_cache() {
    let (sink, mut session) = session();
    session.set_market("BTCEUR", MarketOptions::default());
    seed_one_period(&mut session);

    session.fetch_more(500);

    assert_eq!(session.periods().len(), 1);
    let commands = sink.commands();
    let (verb, arguments) = commands.last().expect("a command");
    assert_eq!(verb, "request_more_data");
    assert_eq!(
        arguments,
        &vec![json!(session.session_id()), json!("$prices"), json!(500)]
    );
}

// =============================================================================
// Inbound data
// =============================================================================

#[test]
fn symbol_resolution_stores_metadata_and_notifies_once() {
    let (_sink, mut session) = session();
    let loads = Arc::new(Mutex::new(0));
    let l = Arc::clone(&loads);
    session.on_symbol_loaded(move || *l.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "symbol_resolved",
        "p": [id, "ser_1", {
            "name": "BTCEUR",
            "full_name": "COINBASE:BTCEUR",
            "exchange": "COINBASE",
            "type": "crypto",
        }],
    })));

    assert_eq!(*loads.lock(), 1);
    let info = session.market_info().expect("metadata");
    assert_eq!(info.series_id, "ser_1");
    assert_eq!(info.full_name, "COINBASE:BTCEUR");
    assert_eq!(info.market_type, "crypto");
}

#[test]
fn data_packet_populates_the_cache_and_notifies_once() {
    let (_sink, mut session) = session();
    let updates = Arc::new(Mutex::new(0));
    let u = Arc::clone(&updates);
    session.on_update(move || *u.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(price_packet(
        &id,
        json!([
            {"i": 0, "v": [1000, 10, 12, 9, 11, 5.004]},
            {"i": 1, "v": [2000, 11, 13, 10, 12, 7.5]},
        ]),
    ));

    // One notification for the whole packet, newest period first.
    assert_eq!(*updates.lock(), 1);
    let periods = session.periods();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].time, 2000);
    assert_eq!(periods[1].time, 1000);
    assert_eq!(periods[1].max, 12.0);
    assert_eq!(periods[1].min, 9.0);
    assert_eq!(periods[1].volume, 5.0);
}

#[test]
fn same_timestamp_overwrites_the_cached_period() {
    let (_sink, mut session) = session();
    let id = session.session_id().to_string();

    session.handle_packet(price_packet(&id, json!([{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}])));
    session.handle_packet(price_packet(&id, json!([{"i": 0, "v": [1000, 1, 2.5, 0.5, 2.4, 9]}])));

    let periods = session.periods();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].close, 2.4);
    assert_eq!(periods[0].volume, 9.0);
}

#[test]
fn timescale_update_and_du_are_equivalent() {
    let (_sink, mut session) = session();
    let id = session.session_id().to_string();

    session.handle_packet(packet(json!({
        "m": "timescale_update",
        "p": [id, {"$prices": {"s": [{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}]}}],
    })));

    assert_eq!(session.periods().len(), 1);
}

#[test]
fn unknown_packet_kind_is_ignored() {
    let (_sink, mut session) = session();
    let events = Arc::new(Mutex::new(0));
    let e = Arc::clone(&events);
    session.on_event(move |_| *e.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({"m": "quote_completed", "p": [id]})));

    assert_eq!(*events.lock(), 0);
    assert!(session.periods().is_empty());
}

// =============================================================================
// Observers
// =============================================================================

#[test]
fn update_observers_fan_out_and_catch_all_sees_channels() {
    let (_sink, mut session) = session();
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));
    let channels = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::clone(&first);
    session.on_update(move || *f.lock() += 1);
    let s = Arc::clone(&second);
    session.on_update(move || *s.lock() += 1);
    let c = Arc::clone(&channels);
    session.on_event(move |event| c.lock().push(event.channel()));

    let id = session.session_id().to_string();
    session.handle_packet(price_packet(&id, json!([{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}])));

    assert_eq!(*first.lock(), 1);
    assert_eq!(*second.lock(), 1);
    assert_eq!(*channels.lock(), vec!["update"]);
}

#[test]
fn each_error_kind_reaches_the_error_channel() {
    let (_sink, mut session) = session();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&errors);
    session.on_error(move |chart_error| e.lock().push(chart_error.clone()));

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "symbol_error",
        "p": [id, "ser_1", "invalid symbol"],
    })));
    session.handle_packet(packet(json!({
        "m": "series_error",
        "p": [id, "$prices", "s1", "bad timeframe"],
    })));
    session.handle_packet(packet(json!({
        "m": "critical_error",
        "p": [id, "protocol", "session limit reached"],
    })));

    assert_eq!(
        *errors.lock(),
        vec![
            ChartError::Symbol {
                series_id: "ser_1".to_string(),
                message: "invalid symbol".to_string(),
            },
            ChartError::Series {
                message: "bad timeframe".to_string(),
            },
            ChartError::Critical {
                name: "protocol".to_string(),
                description: "session limit reached".to_string(),
            },
        ]
    );
}

#[test]
fn unobserved_errors_fall_back_to_diagnostics() {
    let sink = Arc::new(RecordingSink::default());
    let reports = Arc::new(Mutex::new(Vec::new()));
    let mut session = ChartSession::with_diagnostics(
        sink,
        Box::new(SharedDiagnostics(reports.clone())),
    );
    let catch_all = Arc::new(Mutex::new(0));
    let c = Arc::clone(&catch_all);
    session.on_event(move |_| *c.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "critical_error",
        "p": [id, "protocol", "boom"],
    })));

    assert_eq!(
        *reports.lock(),
        vec![ChartError::Critical {
            name: "protocol".to_string(),
            description: "boom".to_string(),
        }]
    );
    // The fallback path bypasses the catch-all channel.
    assert_eq!(*catch_all.lock(), 0);
}

#[test]
fn error_events_reach_the_catch_all_when_observed() {
    let (_sink, mut session) = session();
    let events = Arc::new(Mutex::new(Vec::new()));

    session.on_error(|_| {});
    let e = Arc::clone(&events);
    session.on_event(move |event| e.lock().push(event.clone()));

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "series_error",
        "p": [id, "$prices", "s1", "bad framing"],
    })));

    assert_eq!(
        *events.lock(),
        vec![ChartEvent::Error(ChartError::Series {
            message: "bad framing".to_string(),
        })]
    );
}

// =============================================================================
// Study listeners
// =============================================================================

#[test]
fn study_keyed_packets_bypass_session_handling() {
    let (_sink, mut session) = session();
    let study_packets = Arc::new(Mutex::new(Vec::new()));
    let updates = Arc::new(Mutex::new(0));

    let s = Arc::clone(&study_packets);
    session.register_study_listener("st1", move |pkt| s.lock().push(pkt.kind.clone()));
    let u = Arc::clone(&updates);
    session.on_update(move || *u.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "du",
        "p": [id, "st1", {"st1": {"st": []}}],
    })));

    assert_eq!(*study_packets.lock(), vec!["du".to_string()]);
    assert_eq!(*updates.lock(), 0);
    assert!(session.periods().is_empty());
}

#[test]
fn study_sub_feeds_in_data_updates_reach_the_listener() {
    let (_sink, mut session) = session();
    let study_packets = Arc::new(Mutex::new(0));

    let s = Arc::clone(&study_packets);
    session.register_study_listener("st2", move |_| *s.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "du",
        "p": [id, {
            "$prices": {"s": [{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}]},
            "st2": {"st": []},
        }],
    })));

    assert_eq!(*study_packets.lock(), 1);
    assert_eq!(session.periods().len(), 1);
}

#[test]
fn removed_study_listener_no_longer_intercepts() {
    let (_sink, mut session) = session();
    session.register_study_listener("st1", |_| {});
    assert!(session.remove_study_listener("st1"));
    assert!(!session.remove_study_listener("st1"));

    let updates = Arc::new(Mutex::new(0));
    let u = Arc::clone(&updates);
    session.on_update(move || *u.lock() += 1);

    let id = session.session_id().to_string();
    session.handle_packet(packet(json!({
        "m": "du",
        "p": [id, {"$prices": {"s": []}}],
    })));

    assert_eq!(*updates.lock(), 1);
}

// =============================================================================
// Routing
// =============================================================================

#[test]
fn table_routes_packets_to_the_owning_session() {
    let sink = Arc::new(RecordingSink::default());
    let sessions = SessionTable::new();
    let first = ChartHandle::create(sink.clone(), &sessions);
    let second = ChartHandle::create(sink, &sessions);

    let routed = sessions.dispatch(price_packet(
        second.session_id(),
        json!([{"i": 0, "v": [1000, 1, 2, 0.5, 1.5, 3]}]),
    ));

    assert!(routed);
    assert!(first.with_session(|session| session.periods().is_empty()));
    assert_eq!(second.periods().len(), 1);
}
