//! Application Layer
//!
//! Port definitions sitting between the chart-session core and its
//! collaborators.

pub mod ports;
