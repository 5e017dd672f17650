//! Frame Codec
//!
//! Encodes outbound commands and decodes inbound packets as single JSON
//! objects per text frame:
//!
//! ```json
//! {"m": "<kind>", "p": [<arguments>]}
//! ```
//!
//! The vendor's length-prefixed transport envelope is out of scope here; the
//! transport is assumed to deliver one complete packet per frame.

use serde::Serialize;
use serde_json::Value;

use super::messages::InboundPacket;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outbound command frame.
#[derive(Debug, Serialize)]
struct OutboundFrame<'a> {
    #[serde(rename = "m")]
    command: &'a str,
    #[serde(rename = "p")]
    arguments: &'a [Value],
}

/// JSON codec for chart service frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into an inbound packet.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a JSON object with a `m` kind
    /// tag.
    pub fn decode(&self, text: &str) -> Result<InboundPacket, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode a command and its argument array into a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self, command: &str, arguments: &[Value]) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&OutboundFrame { command, arguments })?)
    }
}
