//! tidegate-core — shared data model for the tidegate autoscaler.
//!
//! Holds the types every other crate speaks in: metrics snapshots,
//! audit decisions, the status view, and the validated `ScalerConfig`.
//!
//! # Configuration
//!
//! ```text
//! env (TARGET_NAMESPACE, MIN_REPLICAS, COOLDOWN, ...)
//!   └─ overrides tidegate.toml ([target], [scaling])
//!        └─ overrides built-in defaults
//! ```

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigFile, ScalerConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
