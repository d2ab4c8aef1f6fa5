//! The metrics capability consumed by the controller.
//!
//! A `MetricsSource` produces one `MetricsSnapshot` per call. The
//! placeholder `StaticSource` returns fixed values that can be overridden
//! through the environment, which is enough to drive the controller and the
//! what-if surface without a real backend.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use tidegate_core::MetricsSnapshot;

pub const ENV_FAKE_CPU: &str = "FAKE_CPU";
pub const ENV_FAKE_MEM: &str = "FAKE_MEM";
pub const ENV_FAKE_P95: &str = "FAKE_P95";

const DEFAULT_CPU: f64 = 250.0;
const DEFAULT_MEM: f64 = 256.0;
const DEFAULT_P95: f64 = 120.0;

/// Errors a metrics backend can report.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// No usable sample could be produced this round.
    #[error("metrics unavailable: {0}")]
    Unavailable(String),
}

/// Something that can be sampled for the workload's current load.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Take one sample.
    async fn fetch(&self) -> Result<MetricsSnapshot, MetricsError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Placeholder source returning fixed, overridable values.
///
/// Overrides are read on every fetch, so changing `FAKE_CPU` and friends
/// takes effect on the next tick.
pub struct StaticSource {
    lookup: Lookup,
}

impl StaticSource {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through a custom lookup.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn value(&self, key: &str, default: f64) -> Result<f64, MetricsError> {
        match (self.lookup)(key).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<f64>().map_err(|e| {
                MetricsError::Unavailable(format!("{key}={raw:?} is not a number: {e}"))
            }),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl MetricsSource for StaticSource {
    async fn fetch(&self) -> Result<MetricsSnapshot, MetricsError> {
        let cpu = self.value(ENV_FAKE_CPU, DEFAULT_CPU)?;
        let mem = self.value(ENV_FAKE_MEM, DEFAULT_MEM)?;
        let p95 = self.value(ENV_FAKE_P95, DEFAULT_P95)?;
        debug!(cpu, mem, p95, "static metrics sample");
        Ok(MetricsSnapshot::now(cpu, mem, p95))
    }

    fn name(&self) -> &str {
        "static"
    }
}
