//! tidegated — the tidegate daemon.
//!
//! Single binary that assembles the controller for one workload:
//! - Configuration (env > TOML file > defaults)
//! - Metrics source (Prometheus or static placeholder)
//! - Actuator (Kubernetes Deployment or dry run)
//! - Reconcile loop
//! - REST API
//!
//! # Usage
//!
//! ```text
//! tidegated --port 8080 --config /etc/tidegate/tidegate.toml \
//!     --prometheus-url http://prometheus:9090
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tidegate_autoscale::{Actuator, Autoscaler, DryRunActuator};
use tidegate_core::ScalerConfig;
use tidegate_kube::KubeActuator;
use tidegate_metrics::{MetricsSource, PrometheusQueries, PrometheusSource, StaticSource};

const DEFAULT_LOG_FILTER: &str = "info,tidegated=debug,tidegate=debug";
const PROMETHEUS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "tidegated", about = "tidegate autoscaling daemon")]
struct Cli {
    /// Port the HTTP API listens on.
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Time between reconcile ticks.
    #[arg(long, env = "TIDEGATE_INTERVAL", default_value = "5s", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Optional TOML configuration file.
    #[arg(long, env = "TIDEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Prometheus base URL; the static placeholder source is used when unset.
    #[arg(long, env = "PROMETHEUS_URL")]
    prometheus_url: Option<String>,

    /// Value of the Access-Control-Allow-Origin header.
    #[arg(long, env = "ALLOW_ORIGIN", default_value = "*")]
    allow_origin: String,

    /// Log replica changes instead of applying them to the cluster.
    #[arg(long, env = "TIDEGATE_DRY_RUN")]
    dry_run: bool,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    run(cli).await
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("tidegate daemon starting");

    // ── Configuration ──────────────────────────────────────────

    let config = ScalerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(
        namespace = %config.namespace,
        deployment = %config.deployment,
        min = config.min_replicas,
        max = config.max_replicas,
        thresholds = %config.thresholds_summary(),
        cooldown = ?config.cooldown,
        "configuration loaded"
    );

    let allow_origin = HeaderValue::from_str(&cli.allow_origin)
        .with_context(|| format!("invalid --allow-origin value {:?}", cli.allow_origin))?;

    // ── Actuator ───────────────────────────────────────────────

    let actuator: Arc<dyn Actuator> = if cli.dry_run {
        info!("dry run: replica changes will not be applied");
        Arc::new(DryRunActuator::new(config.min_replicas))
    } else {
        let kube = KubeActuator::from_environment(&config.namespace, &config.deployment)
            .await
            .context("building Kubernetes client")?;
        info!("kubernetes client initialized");
        Arc::new(kube)
    };

    // ── Metrics source ─────────────────────────────────────────

    let metrics: Arc<dyn MetricsSource> = match cli.prometheus_url.as_deref() {
        Some(url) => {
            let queries = PrometheusQueries::for_workload(&config.namespace, &config.deployment);
            let source = PrometheusSource::new(url, queries, PROMETHEUS_TIMEOUT)
                .context("building Prometheus client")?;
            info!(%url, "using Prometheus metrics source");
            Arc::new(source)
        }
        None => {
            info!("no Prometheus URL given, using static placeholder metrics");
            Arc::new(StaticSource::from_env())
        }
    };

    let min_replicas = config.min_replicas;
    let scaler = Autoscaler::new(config, min_replicas, metrics, actuator);
    if let Err(e) = scaler.resync().await {
        warn!(
            error = %e,
            fallback = min_replicas,
            "could not read live replica count, starting from min_replicas"
        );
    }
    info!(replicas = scaler.replicas().await, "autoscaler initialized");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start reconcile loop ───────────────────────────────────

    let loop_scaler = scaler.clone();
    let interval = cli.interval;
    let loop_handle = tokio::spawn(async move {
        loop_scaler.run(interval, shutdown_rx).await;
    });

    // ── Start API server ───────────────────────────────────────

    let router = tidegate_api::build_router(scaler, allow_origin);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // An in-flight tick finishes before the loop observes the signal.
    let _ = loop_handle.await;

    info!("tidegate daemon stopped");
    Ok(())
}
