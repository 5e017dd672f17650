//! Configuration
//!
//! Environment-driven settings for the demo binary.

mod settings;

pub use settings::{ClientConfig, ConfigError};
