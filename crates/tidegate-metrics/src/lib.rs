//! tidegate-metrics — load signals for the tidegate controller.
//!
//! Defines the `MetricsSource` capability the controller samples on every
//! tick, ships two implementations, and renders the controller status in
//! Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! MetricsSource (trait)
//!   ├── StaticSource     ← fixed values, FAKE_CPU/FAKE_MEM/FAKE_P95 overrides
//!   └── PrometheusSource ← instant queries against /api/v1/query
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod prometheus;
pub mod query;
pub mod source;

pub use prometheus::render_prometheus;
pub use query::{PrometheusQueries, PrometheusSource};
pub use source::{MetricsError, MetricsSource, StaticSource};
