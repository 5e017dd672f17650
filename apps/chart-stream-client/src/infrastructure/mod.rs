//! Infrastructure layer: wire protocol, session state machinery, transport
//! and configuration adapters.

pub mod config;
pub mod events;
pub mod protocol;
pub mod session;
pub mod studies;
pub mod transport;
