//! Metrics server of the validator.

use actix_web::{get, App, HttpServer, Responder};
use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use prometheus::{register_int_gauge_vec, Encoder, IntGaugeVec, TextEncoder};

lazy_static! {
    /// Build information of the running validator.
    pub(crate) static ref VERSION_INFO: IntGaugeVec = register_int_gauge_vec!(
        "kroma_validator_info",
        "Build information of the running validator",
        &["version"]
    )
    .expect("Failed to register version info metric");
}

/// Records the running version and starts the metrics server.
pub(crate) async fn serve_metrics(bind: &str) -> Result<()> {
    VERSION_INFO.with_label_values(&[crate::VERSION]).set(1);
    HttpServer::new(|| App::new().service(index).service(metrics))
        .bind(bind)
        .map_err(|e| anyhow!(e))?
        .run()
        .await
        .map_err(|e| anyhow!(e))
}

#[get("/")]
async fn index() -> impl Responder {
    "kroma-validator-metrics-server: visit /metrics to view metrics"
}

#[get("/metrics")]
async fn metrics() -> impl Responder {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(target: "metrics", "Failed to encode prometheus metrics: {:?}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
