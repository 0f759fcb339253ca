//! HTTP surface of the shelf: catalog protocol, admin API, metrics.

pub mod api;
pub mod metrics;
pub mod state;
