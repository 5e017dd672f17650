//! Environment Settings
//!
//! Reads connection and demo parameters from the process environment.
//! A `.env` file is honored when present (loaded by the binary entrypoint
//! before these lookups run).

use std::env;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent or unreadable.
    #[error("missing required environment variable: {0}")]
    MissingVariable(&'static str),

    /// A numeric variable failed to parse.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Settings for one client process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chart server.
    pub url: String,

    /// Symbol the demo subscribes to.
    pub symbol: String,

    /// Chart timeframe (e.g. `"240"` for four hours, `"D"` for daily).
    pub timeframe: String,

    /// Number of periods to request.
    pub range: i64,
}

impl ClientConfig {
    /// Read settings from the environment.
    ///
    /// `CHART_WS_URL` is required; the rest default to a four-hour Bitcoin
    /// chart with one hundred periods.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `CHART_WS_URL` is unset or
    /// `CHART_RANGE` is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("CHART_WS_URL").ok_or(ConfigError::MissingVariable("CHART_WS_URL"))?;
        let symbol = lookup("CHART_SYMBOL").unwrap_or_else(|| "BINANCE:BTCEUR".to_string());
        let timeframe = lookup("CHART_TIMEFRAME").unwrap_or_else(|| "240".to_string());
        let range = match lookup("CHART_RANGE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "CHART_RANGE",
                value,
            })?,
            None => 100,
        };

        Ok(Self {
            url,
            symbol,
            timeframe,
            range,
        })
    }
}
