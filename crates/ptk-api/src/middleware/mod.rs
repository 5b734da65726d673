//! # HTTP Middleware
//!
//! - `metrics`: per-request counters and the `/metrics` exposition route.

pub mod metrics;
