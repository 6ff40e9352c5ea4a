use std::net::SocketAddr;

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::select;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::info;

use crate::error::Result;

pub mod command;
pub mod config;
pub mod error;

pub fn init_metrics(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    describe_counter!("orders.placed_total", "number of orders written");
    describe_counter!("orders.failed_total", "number of orders that failed to write");
    describe_counter!(
        "catalog.products_loaded_total",
        "number of products written to the catalog"
    );
    info!("metrics are served on http://{addr}/metrics");

    Ok(())
}

/// Flips the returned channel to `true` on SIGINT or SIGTERM.
pub fn init_shutdown_signal() -> Result<watch::Receiver<bool>> {
    let mut sig_int = tokio::signal::unix::signal(SignalKind::interrupt())?;
    let mut sig_term = tokio::signal::unix::signal(SignalKind::terminate())?;
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        select! {
            _ = sig_int.recv() => info!("SIGINT received"),
            _ = sig_term.recv() => info!("SIGTERM received"),
        }
        let _ = tx.send(true);
    });

    Ok(rx)
}
