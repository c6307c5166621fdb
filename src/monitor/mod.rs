// src/monitor/mod.rs
//! Counters for connections and commands, exposed over HTTP for Prometheus.
mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use warp::Filter;

pub use metrics::Metrics;

/// Serve `GET /metrics` until the task is dropped.
pub async fn serve_metrics(metrics: Arc<Metrics>, addr: SocketAddr) {
    let route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || metrics.to_prometheus());

    info!(%addr, "metrics endpoint listening");
    warp::serve(route).run(addr).await;
}
