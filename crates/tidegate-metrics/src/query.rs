//! Prometheus-backed metrics source.
//!
//! Issues one instant query per signal against the Prometheus HTTP API
//! (`GET /api/v1/query`) and takes the first sample of each result vector.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use tidegate_core::MetricsSnapshot;

use crate::source::{MetricsError, MetricsSource};

/// PromQL expressions for the three signals.
#[derive(Debug, Clone, PartialEq)]
pub struct PrometheusQueries {
    /// Average CPU per pod, millicores.
    pub cpu: String,
    /// Average working-set memory per pod, MiB.
    pub mem: String,
    /// P95 request latency, milliseconds.
    pub p95: String,
}

impl PrometheusQueries {
    /// Default queries scoped to one deployment's pods.
    pub fn for_workload(namespace: &str, deployment: &str) -> Self {
        let selector = format!(r#"namespace="{namespace}",pod=~"{deployment}-.*",container!="""#);
        Self {
            cpu: format!(
                "avg(rate(container_cpu_usage_seconds_total{{{selector}}}[1m])) * 1000"
            ),
            mem: format!("avg(container_memory_working_set_bytes{{{selector}}}) / 1048576"),
            p95: format!(
                r#"histogram_quantile(0.95, sum(rate(http_request_duration_seconds_bucket{{namespace="{namespace}"}}[1m])) by (le)) * 1000"#
            ),
        }
    }
}

/// Instant query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    data: Option<QueryData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    /// `[unix_ts, "value"]`
    value: (f64, String),
}

/// Metrics source that queries a Prometheus server.
pub struct PrometheusSource {
    client: reqwest::Client,
    base_url: String,
    queries: PrometheusQueries,
}

impl PrometheusSource {
    /// Create a source against `base_url` (e.g. `http://prometheus:9090`).
    pub fn new(
        base_url: &str,
        queries: PrometheusQueries,
        timeout: Duration,
    ) -> Result<Self, MetricsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::Unavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            queries,
        })
    }

    async fn query_scalar(&self, query: &str) -> Result<f64, MetricsError> {
        let response = self
            .client
            .get(format!("{}/api/v1/query", self.base_url))
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| MetricsError::Unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetricsError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| MetricsError::Unavailable(format!("bad response: {e}")))?;

        first_sample(body)
    }
}

/// Pull the first sample value out of an instant-vector response.
fn first_sample(body: QueryResponse) -> Result<f64, MetricsError> {
    if body.status != "success" {
        return Err(MetricsError::Unavailable(
            body.error.unwrap_or_else(|| format!("query status {}", body.status)),
        ));
    }

    let data = body
        .data
        .ok_or_else(|| MetricsError::Unavailable("response has no data".to_string()))?;

    if data.result_type != "vector" {
        return Err(MetricsError::Unavailable(format!(
            "expected vector result, got {}",
            data.result_type
        )));
    }

    let sample = data
        .result
        .into_iter()
        .next()
        .ok_or_else(|| MetricsError::Unavailable("empty result".to_string()))?;

    let value = sample
        .value
        .1
        .parse::<f64>()
        .map_err(|e| MetricsError::Unavailable(format!("non-numeric sample: {e}")))?;

    // Prometheus encodes missing data as NaN.
    if !value.is_finite() {
        return Err(MetricsError::Unavailable(format!("sample is {value}")));
    }
    Ok(value)
}

#[async_trait]
impl MetricsSource for PrometheusSource {
    async fn fetch(&self) -> Result<MetricsSnapshot, MetricsError> {
        let result = tokio::try_join!(
            self.query_scalar(&self.queries.cpu),
            self.query_scalar(&self.queries.mem),
            self.query_scalar(&self.queries.p95),
        );

        match result {
            Ok((cpu, mem, p95)) => {
                debug!(cpu, mem, p95, "prometheus metrics sample");
                Ok(MetricsSnapshot::now(cpu, mem, p95))
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "prometheus query failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "prometheus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<f64, MetricsError> {
        first_sample(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn reads_first_vector_sample() {
        let value = parse(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{"pod":"sample-app-1"},"value":[1700000000.5,"612.25"]},
                {"metric":{"pod":"sample-app-2"},"value":[1700000000.5,"1.0"]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(value, 612.25);
    }

    #[test]
    fn empty_vector_is_unavailable() {
        let err = parse(r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("empty result"));
    }

    #[test]
    fn error_status_carries_message() {
        let err = parse(r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn nan_sample_is_unavailable() {
        let err = parse(
            r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{},"value":[1,"NaN"]}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::Unavailable(_)));
    }

    #[test]
    fn matrix_result_rejected() {
        let err = parse(r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("matrix"));
    }

    #[test]
    fn default_queries_scope_to_workload() {
        let q = PrometheusQueries::for_workload("shop", "web");
        assert!(q.cpu.contains(r#"namespace="shop""#));
        assert!(q.cpu.contains(r#"pod=~"web-.*""#));
        assert!(q.mem.contains("1048576"));
        assert!(q.p95.starts_with("histogram_quantile(0.95"));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // Port 9 (discard) on localhost is not an HTTP server.
        let source = PrometheusSource::new(
            "http://127.0.0.1:9/",
            PrometheusQueries::for_workload("ns", "app"),
            Duration::from_millis(500),
        )
        .unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, MetricsError::Unavailable(_)));
    }
}
