//! Demo binary: stream one chart and log every update.
//!
//! Connects to the configured endpoint, opens a single chart session bound to
//! the configured symbol, and logs resolved market metadata plus the latest
//! period on each update until Ctrl-C. Observers forward events through a
//! channel so session state is read outside the session lock.

use anyhow::Context;
use chrono::DateTime;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chart_stream_client::infrastructure::config::ClientConfig;
use chart_stream_client::infrastructure::session::ChartHandle;
use chart_stream_client::infrastructure::transport::{SessionTable, WebSocketTransport};
use chart_stream_client::{ChartEvent, MarketOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env().context("failed to load configuration")?;
    info!(symbol = %config.symbol, timeframe = %config.timeframe, "starting chart client");

    let sessions = SessionTable::new();
    let transport = WebSocketTransport::connect(&config, sessions.clone())
        .await
        .context("failed to connect")?;

    let chart = ChartHandle::create(transport.sink(), &sessions);
    info!(session = chart.session_id(), "chart session open");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ChartEvent>();
    let tx = event_tx.clone();
    chart.on_symbol_loaded(move || {
        tx.send(ChartEvent::SymbolLoaded).ok();
    });
    let tx = event_tx.clone();
    chart.on_update(move || {
        tx.send(ChartEvent::Update).ok();
    });
    chart.on_error(move |chart_error| {
        event_tx.send(ChartEvent::Error(chart_error.clone())).ok();
    });

    let reader = chart.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ChartEvent::SymbolLoaded => {
                    if let Some(market) = reader.market_info() {
                        info!(
                            market = %market.full_name,
                            description = %market.description,
                            exchange = %market.exchange,
                            "symbol resolved"
                        );
                    }
                }
                ChartEvent::Update => {
                    if let Some(latest) = reader.periods().first() {
                        let time = DateTime::from_timestamp(latest.time, 0)
                            .map_or_else(|| latest.time.to_string(), |t| t.to_rfc3339());
                        info!(
                            %time,
                            open = latest.open,
                            close = latest.close,
                            volume = latest.volume,
                            "period update"
                        );
                    }
                }
                ChartEvent::Error(chart_error) => error!(%chart_error, "chart error"),
            }
        }
    });

    chart.set_market(
        config.symbol.clone(),
        MarketOptions {
            timeframe: Some(config.timeframe.clone()),
            range: Some(config.range.unsigned_abs()),
            ..MarketOptions::default()
        },
    );

    tokio::select! {
        result = transport.run() => match result {
            Ok(()) => warn!("transport stopped"),
            Err(transport_error) => error!(%transport_error, "transport failed"),
        },
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    chart.delete();
    Ok(())
}
