use std::sync::Arc;

use anyhow::Result;
use billing_service::{config::AppConfig, metrics_server, observability, server, BillingService};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let server_cfg = cfg
        .server
        .clone()
        .ok_or_else(|| anyhow::anyhow!("[server] section with bind_addr is required to serve HTTP"))?;

    let service = Arc::new(BillingService::from_config(&cfg)?);
    server::serve(&server_cfg.bind_addr, service).await
}
