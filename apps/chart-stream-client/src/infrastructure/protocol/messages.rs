//! Chart Service Message Types
//!
//! Wire types for the chart service's packet protocol. Every inbound packet
//! is a `{kind, arguments}` pair whose first argument is the session
//! identifier; the transport routes packets to the owning session before any
//! of these types interpret them.
//!
//! # Packet kinds
//!
//! - `symbol_resolved`: market metadata for a resolve request
//! - `timescale_update` / `du`: sub-feed data (two wire names, identical
//!   semantics; `du` carries live deltas, `timescale_update` backfill)
//! - `symbol_error`, `series_error`, `critical_error`: error reports
//! - anything else: ignored for forward compatibility
//!
//! Classification is deliberately lenient: missing or mistyped arguments
//! degrade to empty defaults instead of failing dispatch, matching the
//! service's loosely-shaped payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::market::MarketInfo;
use crate::domain::period::PricePeriod;

// =============================================================================
// Wire Constants
// =============================================================================

/// Reserved sub-feed name carrying price-period data.
pub const PRICE_FEED: &str = "$prices";

/// Sub-series identifier within a chart session.
pub const SUB_SERIES_ID: &str = "s1";

/// Command: open a chart session.
pub const CMD_CREATE_SESSION: &str = "chart_create_session";

/// Command: close a chart session.
pub const CMD_DELETE_SESSION: &str = "chart_delete_session";

/// Command: resolve a market symbol under a fresh series identity.
pub const CMD_RESOLVE_SYMBOL: &str = "resolve_symbol";

/// Command: create the session's price series.
pub const CMD_CREATE_SERIES: &str = "create_series";

/// Command: modify the session's existing price series.
pub const CMD_MODIFY_SERIES: &str = "modify_series";

/// Command: switch the session's timezone.
pub const CMD_SWITCH_TIMEZONE: &str = "switch_timezone";

/// Command: request additional older periods on the existing feed.
pub const CMD_REQUEST_MORE_DATA: &str = "request_more_data";

// =============================================================================
// Inbound Packet
// =============================================================================

/// One inbound packet as delivered by the transport.
///
/// # Wire Format (JSON)
/// ```json
/// {"m": "timescale_update", "p": ["cs_xxxxxxxxxxxx", {"$prices": {"s": []}}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundPacket {
    /// Packet kind tag.
    #[serde(rename = "m")]
    pub kind: String,

    /// Ordered argument list; `arguments[0]` is the session identifier.
    #[serde(rename = "p", default)]
    pub arguments: Vec<Value>,
}

impl InboundPacket {
    /// The session identifier the packet is addressed to, if present.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.arguments.first().and_then(Value::as_str)
    }

    /// Argument at `index` as a string, if it is one.
    #[must_use]
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).and_then(Value::as_str)
    }
}

// =============================================================================
// Series Update Payload
// =============================================================================

/// One period record within a price sub-feed payload.
///
/// # Wire Format (JSON)
/// ```json
/// {"i": 0, "v": [1000, 10, 12, 9, 11, 5.004]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PeriodRecord {
    /// Bar index within the series window.
    #[serde(rename = "i", default)]
    pub index: i64,

    /// Value vector: `[time, open, max, min, close, volume]`.
    #[serde(rename = "v", default)]
    pub values: Vec<f64>,
}

impl PeriodRecord {
    /// Reconstruct the OHLCV period this record describes.
    ///
    /// The vector assigns index 2 to the period maximum and index 3 to the
    /// minimum; preserved as observed from the service rather than assuming
    /// the conventional high/low ordering. Volume is rounded to two decimal
    /// places. Short vectors yield `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn period(&self) -> Option<PricePeriod> {
        if self.values.len() < 6 {
            return None;
        }

        Some(PricePeriod {
            time: self.values[0] as i64,
            open: self.values[1],
            max: self.values[2],
            min: self.values[3],
            close: self.values[4],
            volume: (self.values[5] * 100.0).round() / 100.0,
        })
    }
}

/// Price sub-feed payload: the set of period records in one packet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesUpdate {
    /// Period records carried by this update.
    #[serde(rename = "s", default)]
    pub records: Vec<PeriodRecord>,
}

impl SeriesUpdate {
    /// Parse a sub-feed payload value. Payloads without period records (or
    /// of unexpected shape) yield an empty update.
    #[must_use]
    pub fn from_value(payload: &Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }
}

// =============================================================================
// Classified Chart Message
// =============================================================================

/// An inbound packet classified by kind.
///
/// A closed variant set matched exhaustively by the session's router;
/// unrecognized kinds land in [`ChartMessage::Unrecognized`] and are ignored
/// so newer service packet kinds never break older clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartMessage {
    /// Symbol resolution succeeded; carries the merged market metadata.
    SymbolResolved {
        /// The resolved market metadata (boxed: large variant).
        info: Box<MarketInfo>,
    },

    /// Sub-feed data update (`timescale_update` or `du`).
    DataUpdate {
        /// Mapping from sub-feed name to sub-feed payload.
        feeds: serde_json::Map<String, Value>,
    },

    /// Symbol resolution failed.
    SymbolError {
        /// Series identity the resolve was issued under.
        series_id: String,
        /// Service-provided message.
        message: String,
    },

    /// Series creation or modification failed.
    SeriesError {
        /// Service-provided message.
        message: String,
    },

    /// Service-originated fatal condition.
    CriticalError {
        /// Error name.
        name: String,
        /// Error description.
        description: String,
    },

    /// Unknown packet kind, ignored for forward compatibility.
    Unrecognized {
        /// The unrecognized kind tag.
        kind: String,
    },
}

impl ChartMessage {
    /// Classify a raw packet by its kind tag.
    #[must_use]
    pub fn classify(packet: &InboundPacket) -> Self {
        match packet.kind.as_str() {
            "symbol_resolved" => {
                let series_id = packet.arg_str(1).unwrap_or_default().to_string();
                let metadata = packet.arguments.get(2).cloned().unwrap_or(Value::Null);
                Self::SymbolResolved {
                    info: Box::new(MarketInfo::from_resolved(series_id, &metadata)),
                }
            }
            "timescale_update" | "du" => {
                let feeds = packet
                    .arguments
                    .get(1)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Self::DataUpdate { feeds }
            }
            "symbol_error" => Self::SymbolError {
                series_id: packet.arg_str(1).unwrap_or_default().to_string(),
                message: packet.arg_str(2).unwrap_or_default().to_string(),
            },
            "series_error" => Self::SeriesError {
                message: packet.arg_str(3).unwrap_or_default().to_string(),
            },
            "critical_error" => Self::CriticalError {
                name: packet.arg_str(1).unwrap_or_default().to_string(),
                description: packet.arg_str(2).unwrap_or_default().to_string(),
            },
            other => Self::Unrecognized {
                kind: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
