use anyhow::{bail, Result};
use billing_service::{config::AppConfig, observability, BillingService, Status};

/// One scan of the latest snapshot, as a scheduled job would run it.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let service = BillingService::from_config(&cfg)?;

    let response = service.anomaly_scan().await;
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.status != Status::Ok {
        bail!("anomaly scan finished with status {}", response.status.code());
    }
    Ok(())
}
