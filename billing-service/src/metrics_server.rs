use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and serve `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics.bind_addr: {e}"))?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    // Only the first call wins; later calls keep the original recorder.
    let _ = PROM_HANDLE.set(handle);

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
