//! Domain Layer
//!
//! Core chart-session types with no transport dependencies.

pub mod errors;
pub mod market;
pub mod period;
