//! Chart Stream Client
//!
//! A client for a streaming market-data chart service. One WebSocket
//! connection multiplexes any number of logical chart sessions; each session
//! binds to a market symbol, reconstructs an OHLCV period series from
//! incremental updates, and fans events out to registered observers.
//!
//! # Architecture
//!
//! - `domain`: period cache, market metadata and session error types
//! - `application`: the ports sessions talk through (command and diagnostic
//!   sinks)
//! - `infrastructure`: the wire protocol, the session state machine, the
//!   WebSocket transport and environment configuration
//!
//! # Usage
//!
//! ```no_run
//! use chart_stream_client::infrastructure::config::ClientConfig;
//! use chart_stream_client::infrastructure::session::ChartHandle;
//! use chart_stream_client::infrastructure::transport::{SessionTable, WebSocketTransport};
//! use chart_stream_client::MarketOptions;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let sessions = SessionTable::new();
//! let transport = WebSocketTransport::connect(&config, sessions.clone()).await?;
//!
//! let chart = ChartHandle::create(transport.sink(), &sessions);
//! chart.set_market("BINANCE:BTCEUR", MarketOptions::default());
//! transport.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::errors::ChartError;
pub use domain::market::{Adjustment, ChartStyle, MarketInfo, MarketOptions, SessionKind};
pub use domain::period::{PeriodCache, PricePeriod};
pub use infrastructure::events::ChartEvent;
pub use infrastructure::session::{ChartHandle, ChartSession};
pub use infrastructure::transport::{SessionTable, WebSocketTransport};
