//! Market Metadata and Symbol Resolution Types
//!
//! Types describing what a chart session is bound to: the resolved market's
//! metadata, the symbol-resolution descriptor sent to the service, and the
//! custom chart aggregation styles with their per-style input records.
//!
//! # Symbol resolution
//!
//! A plain market binds with a flat descriptor:
//!
//! ```json
//! {"symbol": "COINBASE:BTCEUR", "adjustment": "splits"}
//! ```
//!
//! When a custom aggregation style is requested the descriptor is wrapped,
//! tagging the vendor bar-set and carrying the style's inputs verbatim:
//!
//! ```json
//! {
//!   "symbol": {"symbol": "COINBASE:BTCEUR", "adjustment": "splits"},
//!   "type": "BarSetRenko@tv-prostudies-40!",
//!   "inputs": {"style": "ATR", "atrLength": 14, "wicks": true}
//! }
//! ```
//!
//! Input records are passed through without validation; accepting or
//! rejecting parameter combinations is the service's responsibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Market Info
// =============================================================================

/// Subsession descriptor within a market's session calendar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subsession {
    /// Subsession ID (ex: "regular").
    #[serde(default)]
    pub id: String,

    /// Subsession description (ex: "Regular").
    #[serde(default)]
    pub description: String,

    /// Whether the subsession is private.
    #[serde(default)]
    pub private: bool,

    /// Session hours (ex: "24x7").
    #[serde(default)]
    pub session: String,

    /// Session correction rules.
    #[serde(rename = "session-correction", default)]
    pub session_correction: Option<String>,

    /// Session display string (ex: "24x7").
    #[serde(rename = "session-display", default)]
    pub session_display: Option<String>,
}

/// Last-resolved market metadata for a chart session.
///
/// Replaced wholesale on each successful symbol resolution and exposed
/// read-only to callers. Fields the service adds beyond the typed set are
/// retained in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Series identity the resolution was issued under (ex: "ser_1").
    #[serde(default)]
    pub series_id: String,

    /// Market short name (ex: "BTCEUR").
    #[serde(default)]
    pub name: String,

    /// Market full name (ex: "COINBASE:BTCEUR").
    #[serde(default)]
    pub full_name: String,

    /// Market pro name (ex: "COINBASE:BTCEUR").
    #[serde(default)]
    pub pro_name: String,

    /// Symbol description (ex: "BTC/EUR").
    #[serde(default)]
    pub description: String,

    /// Market exchange (ex: "COINBASE").
    #[serde(default)]
    pub exchange: String,

    /// Listing exchange (ex: "COINBASE").
    #[serde(default)]
    pub listed_exchange: String,

    /// Values provider ID (ex: "coinbase").
    #[serde(default)]
    pub provider_id: String,

    /// Base currency (ex: "BTC").
    #[serde(default)]
    pub base_currency: Option<String>,

    /// Quote currency ID (ex: "EUR").
    #[serde(default)]
    pub currency_id: Option<String>,

    /// Quote currency code (ex: "EUR").
    #[serde(default)]
    pub currency_code: Option<String>,

    /// Price scale (ex: 100 for two decimal places).
    #[serde(default)]
    pub pricescale: Option<f64>,

    /// Point value.
    #[serde(default)]
    pub pointvalue: Option<f64>,

    /// Minimum move value.
    #[serde(default)]
    pub minmov: Option<f64>,

    /// Secondary minimum move value.
    #[serde(default)]
    pub minmove2: Option<f64>,

    /// Whether the market trades fractionally.
    #[serde(default)]
    pub fractional: bool,

    /// Session hours (ex: "24x7").
    #[serde(default)]
    pub session: String,

    /// Session display string.
    #[serde(default)]
    pub session_display: Option<String>,

    /// Market type (ex: "crypto").
    #[serde(rename = "type", default)]
    pub market_type: String,

    /// Market timezone (ex: "Etc/UTC").
    #[serde(default)]
    pub timezone: String,

    /// Whether intraday values are available.
    #[serde(default)]
    pub has_intraday: bool,

    /// Whether the market is currently tradable.
    #[serde(default)]
    pub is_tradable: bool,

    /// Whether replay mode is available.
    #[serde(default)]
    pub is_replayable: bool,

    /// Whether adjustment mode is enabled.
    #[serde(default)]
    pub has_adjustment: bool,

    /// Whether extended hours exist.
    #[serde(default)]
    pub has_extended_hours: bool,

    /// Allowed adjustment (ex: "none").
    #[serde(default)]
    pub allowed_adjustment: Option<String>,

    /// Active subsession ID (ex: "regular").
    #[serde(default)]
    pub subsession_id: Option<String>,

    /// Session calendar subsessions.
    #[serde(default)]
    pub subsessions: Vec<Subsession>,

    /// Any metadata fields beyond the typed set.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MarketInfo {
    /// Build market info from a `symbol_resolved` packet: the merge of the
    /// series identity and the service's metadata object.
    ///
    /// Non-object metadata degrades to an empty record carrying only the
    /// series identity; resolution packets never abort dispatch.
    #[must_use]
    pub fn from_resolved(series_id: String, metadata: &Value) -> Self {
        let mut info: Self = serde_json::from_value(metadata.clone()).unwrap_or_default();
        info.series_id = series_id;
        info
    }
}

// =============================================================================
// Symbol Resolution Descriptor
// =============================================================================

/// Dividend/split adjustment mode for a market binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    /// Splits-adjusted prices (the default).
    #[default]
    Splits,
    /// Dividend-adjusted prices.
    Dividends,
}

/// Trading session selection for a market binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Regular trading hours.
    Regular,
    /// Extended trading hours.
    Extended,
}

/// Symbol-resolution descriptor: the base fields of a market binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSpec {
    /// Market symbol (ex: "COINBASE:BTCEUR").
    pub symbol: String,

    /// Adjustment mode. Defaults to splits-adjusted.
    pub adjustment: Adjustment,

    /// Optional trading-session override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionKind>,

    /// Optional currency conversion override (ex: "EUR").
    #[serde(rename = "currency-id", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SymbolSpec {
    /// Create a descriptor for `symbol` with default adjustment and no
    /// overrides.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            adjustment: Adjustment::default(),
            session: None,
            currency: None,
        }
    }

    /// The resolve-symbol request value: the flat descriptor, or the tagged
    /// wrapper when an aggregation style is requested.
    #[must_use]
    pub fn resolve_request(&self, style: Option<&ChartStyle>) -> Value {
        let base = serde_json::to_value(self).unwrap_or(Value::Null);
        match style {
            None => base,
            Some(style) => serde_json::json!({
                "symbol": base,
                "type": style.bar_set(),
                "inputs": style.inputs(),
            }),
        }
    }
}

// =============================================================================
// Chart Aggregation Styles
// =============================================================================

/// Price source a synthetic aggregation is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Period open.
    Open,
    /// Period high.
    High,
    /// Period low.
    Low,
    /// Period close.
    Close,
    /// (high + low) / 2.
    Hl2,
    /// (high + low + close) / 3.
    Hlc3,
    /// (open + high + low + close) / 4.
    Ohlc4,
}

/// Renko aggregation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenkoInputs {
    /// Price source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceSource>,

    /// Box sizing style (ex: "ATR").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Fixed box size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_size: Option<f64>,

    /// ATR length when the style is ATR-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_length: Option<u32>,

    /// Whether to draw wicks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wicks: Option<bool>,

    /// Sources selector (ex: "Close").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,
}

/// Line Break aggregation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakInputs {
    /// Price source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceSource>,

    /// Number of lines to break.
    #[serde(rename = "lb", skip_serializing_if = "Option::is_none")]
    pub line_break: Option<u32>,
}

/// Kagi aggregation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KagiInputs {
    /// Price source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceSource>,

    /// Reversal sizing style (ex: "ATR").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Reversal amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversal_amount: Option<f64>,

    /// ATR length when the style is ATR-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_length: Option<u32>,
}

/// Point-and-Figure aggregation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointAndFigureInputs {
    /// Sources selector (ex: "Close").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,

    /// Box sizing style (ex: "ATR").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Fixed box size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_size: Option<f64>,

    /// Reversal amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversal_amount: Option<f64>,

    /// ATR length when the style is ATR-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_length: Option<u32>,

    /// One-step-back building mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_step_back_building: Option<bool>,
}

/// Range aggregation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeInputs {
    /// Range size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<u32>,

    /// Whether to emit phantom bars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phantom_bars: Option<bool>,
}

/// Custom chart aggregation style, one typed input record per kind.
///
/// Each variant maps to a vendor bar-set tag; the inputs are forwarded to the
/// service untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartStyle {
    /// Heikin-Ashi candles (no inputs).
    HeikinAshi,
    /// Renko boxes.
    Renko(RenkoInputs),
    /// Line Break.
    LineBreak(LineBreakInputs),
    /// Kagi.
    Kagi(KagiInputs),
    /// Point-and-Figure.
    PointAndFigure(PointAndFigureInputs),
    /// Range bars.
    Range(RangeInputs),
}

impl ChartStyle {
    /// Vendor bar-set tag for this aggregation kind.
    #[must_use]
    pub const fn bar_set(&self) -> &'static str {
        match self {
            Self::HeikinAshi => "BarSetHeikenAshi@tv-basicstudies-60!",
            Self::Renko(_) => "BarSetRenko@tv-prostudies-40!",
            Self::LineBreak(_) => "BarSetPriceBreak@tv-prostudies-34!",
            Self::Kagi(_) => "BarSetKagi@tv-prostudies-34!",
            Self::PointAndFigure(_) => "BarSetPnF@tv-prostudies-34!",
            Self::Range(_) => "BarSetRange@tv-basicstudies-72!",
        }
    }

    /// Caller-supplied inputs as the JSON object sent to the service.
    #[must_use]
    pub fn inputs(&self) -> Value {
        let inputs = match self {
            Self::HeikinAshi => Ok(Value::Object(serde_json::Map::new())),
            Self::Renko(inputs) => serde_json::to_value(inputs),
            Self::LineBreak(inputs) => serde_json::to_value(inputs),
            Self::Kagi(inputs) => serde_json::to_value(inputs),
            Self::PointAndFigure(inputs) => serde_json::to_value(inputs),
            Self::Range(inputs) => serde_json::to_value(inputs),
        };
        inputs.unwrap_or(Value::Null)
    }
}

// =============================================================================
// Market Binding Options
// =============================================================================

/// Options accepted when binding a session to a market.
///
/// Framing fields (`timeframe`, `range`, `reference`) feed the series
/// configuration issued right after resolution; the rest shape the
/// resolution descriptor itself.
#[derive(Debug, Clone, Default)]
pub struct MarketOptions {
    /// Chart period timeframe (ex: "240"). Defaults to four hours.
    pub timeframe: Option<String>,

    /// Number of periods to load. Defaults to 100.
    pub range: Option<u64>,

    /// Reference timestamp the range is anchored at. Defaults to now.
    pub reference: Option<i64>,

    /// Adjustment mode override.
    pub adjustment: Option<Adjustment>,

    /// Trading-session override.
    pub session: Option<SessionKind>,

    /// Currency conversion override.
    pub currency: Option<String>,

    /// Custom aggregation style.
    pub style: Option<ChartStyle>,
}

// =============================================================================
// Tests
// =============================================================================
