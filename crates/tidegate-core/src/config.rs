//! Controller configuration.
//!
//! Values are resolved per key, highest precedence first: environment
//! variable, optional `tidegate.toml` file, built-in default. The result is
//! validated once and stays immutable for the life of the process.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::ReplicaCount;

pub const ENV_NAMESPACE: &str = "TARGET_NAMESPACE";
pub const ENV_DEPLOYMENT: &str = "TARGET_DEPLOYMENT";
pub const ENV_MIN_REPLICAS: &str = "MIN_REPLICAS";
pub const ENV_MAX_REPLICAS: &str = "MAX_REPLICAS";
pub const ENV_CPU_THRESHOLD: &str = "CPU_THRESHOLD";
pub const ENV_MEM_THRESHOLD: &str = "MEM_THRESHOLD";
pub const ENV_P95_THRESHOLD: &str = "P95_THRESHOLD";
pub const ENV_COOLDOWN: &str = "COOLDOWN";

/// Validated controller configuration for a single managed workload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerConfig {
    pub namespace: String,
    pub deployment: String,
    pub min_replicas: ReplicaCount,
    pub max_replicas: ReplicaCount,
    /// Millicores per replica.
    pub cpu_threshold: f64,
    /// MiB per replica.
    pub mem_threshold: f64,
    /// Milliseconds.
    pub p95_threshold: f64,
    /// Minimum time between two successful actuations.
    pub cooldown: Duration,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            namespace: "smart-autoscaler".to_string(),
            deployment: "sample-app".to_string(),
            min_replicas: 1,
            max_replicas: 10,
            cpu_threshold: 500.0,
            mem_threshold: 512.0,
            p95_threshold: 400.0,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// On-disk `tidegate.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub target: Option<TargetSection>,
    pub scaling: Option<ScalingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSection {
    pub namespace: Option<String>,
    pub deployment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalingSection {
    pub min_replicas: Option<ReplicaCount>,
    pub max_replicas: Option<ReplicaCount>,
    pub cpu_threshold: Option<f64>,
    pub mem_threshold: Option<f64>,
    pub p95_threshold: Option<f64>,
    /// Human duration, e.g. "60s" or "1m30s".
    pub cooldown: Option<String>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl ScalerConfig {
    /// Load from the process environment, layered over an optional file.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let file = path.map(ConfigFile::from_file).transpose()?;
        Self::resolve(file.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve every key through `lookup`, then `file`, then the defaults.
    ///
    /// Empty lookup values count as unset.
    pub fn resolve<F>(file: Option<&ConfigFile>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let target = file.and_then(|f| f.target.clone()).unwrap_or_default();
        let scaling = file.and_then(|f| f.scaling.clone()).unwrap_or_default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cooldown = match lookup(ENV_COOLDOWN).or(scaling.cooldown) {
            Some(raw) => parse_duration(ENV_COOLDOWN, &raw)?,
            None => defaults.cooldown,
        };

        let config = Self {
            namespace: lookup(ENV_NAMESPACE)
                .or(target.namespace)
                .unwrap_or(defaults.namespace),
            deployment: lookup(ENV_DEPLOYMENT)
                .or(target.deployment)
                .unwrap_or(defaults.deployment),
            min_replicas: layered(
                ENV_MIN_REPLICAS,
                lookup(ENV_MIN_REPLICAS),
                scaling.min_replicas,
                defaults.min_replicas,
            )?,
            max_replicas: layered(
                ENV_MAX_REPLICAS,
                lookup(ENV_MAX_REPLICAS),
                scaling.max_replicas,
                defaults.max_replicas,
            )?,
            cpu_threshold: layered(
                ENV_CPU_THRESHOLD,
                lookup(ENV_CPU_THRESHOLD),
                scaling.cpu_threshold,
                defaults.cpu_threshold,
            )?,
            mem_threshold: layered(
                ENV_MEM_THRESHOLD,
                lookup(ENV_MEM_THRESHOLD),
                scaling.mem_threshold,
                defaults.mem_threshold,
            )?,
            p95_threshold: layered(
                ENV_P95_THRESHOLD,
                lookup(ENV_P95_THRESHOLD),
                scaling.p95_threshold,
                defaults.p95_threshold,
            )?,
            cooldown,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.namespace.trim().is_empty() || self.deployment.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "namespace and deployment must be set".to_string(),
            ));
        }
        if self.min_replicas < 0 {
            return Err(ConfigError::Invalid(format!(
                "min_replicas must be >= 0, got {}",
                self.min_replicas
            )));
        }
        if self.min_replicas > self.max_replicas {
            return Err(ConfigError::Invalid(format!(
                "min_replicas ({}) exceeds max_replicas ({})",
                self.min_replicas, self.max_replicas
            )));
        }
        for (name, value) in [
            ("cpu_threshold", self.cpu_threshold),
            ("mem_threshold", self.mem_threshold),
            ("p95_threshold", self.p95_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Render the thresholds as recorded on every decision.
    pub fn thresholds_summary(&self) -> String {
        format!(
            "CPU>{:.0},Mem>{:.0},P95>{:.0}",
            self.cpu_threshold, self.mem_threshold, self.p95_threshold
        )
    }

    /// `true` when `replicas` lies inside the configured band.
    pub fn in_band(&self, replicas: ReplicaCount) -> bool {
        (self.min_replicas..=self.max_replicas).contains(&replicas)
    }
}

fn layered<T>(key: &'static str, env: Option<String>, file: Option<T>, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(file.unwrap_or(default)),
    }
}

fn parse_duration(key: &'static str, raw: &str) -> ConfigResult<Duration> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
