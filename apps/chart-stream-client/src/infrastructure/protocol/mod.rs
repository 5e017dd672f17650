//! Chart Service Wire Protocol
//!
//! Inbound packet types, packet classification, and the JSON frame codec for
//! the chart service's duplex transport.

pub mod codec;
pub mod messages;

pub use codec::{CodecError, FrameCodec};
pub use messages::{
    CMD_CREATE_SERIES, CMD_CREATE_SESSION, CMD_DELETE_SESSION, CMD_MODIFY_SERIES,
    CMD_REQUEST_MORE_DATA, CMD_RESOLVE_SYMBOL, CMD_SWITCH_TIMEZONE, ChartMessage, InboundPacket,
    PRICE_FEED, PeriodRecord, SUB_SERIES_ID, SeriesUpdate,
};
