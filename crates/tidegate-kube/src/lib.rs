//! tidegate-kube — applies replica counts to a Kubernetes Deployment.
//!
//! Each change is a read → mutate `spec.replicas` → replace cycle. The
//! replace carries the `resourceVersion` that was read, so a concurrent
//! edit by someone else surfaces as HTTP 409 and the cycle is retried a
//! bounded number of times instead of silently overwriting it.

pub mod actuator;
pub mod retry;

pub use actuator::{KubeActuator, MAX_ATTEMPTS};
