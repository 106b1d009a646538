use anyhow::{bail, Result};
use billing_service::{config::AppConfig, observability, BillingService, Status};
use std::env;

/// The month argument, or a usage error before any config or store access.
fn month_arg(mut args: impl Iterator<Item = String>) -> Result<String> {
    match args.nth(1) {
        Some(month) => Ok(month),
        None => bail!("usage: monthly_report <YYYY-MM>"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let month = month_arg(env::args())?;

    let cfg = AppConfig::load()?;
    let service = BillingService::from_config(&cfg)?;

    let response = service.monthly_query(Some(&month)).await;
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.status != Status::Ok {
        bail!("monthly query finished with status {}", response.status.code());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_month_is_a_usage_error() {
        let err = month_arg(vec!["monthly_report".to_string()].into_iter()).unwrap_err();
        assert!(err.to_string().starts_with("usage:"));
    }

    #[test]
    fn month_is_the_first_argument() {
        let args = vec!["monthly_report".to_string(), "2025-10".to_string()];
        assert_eq!(month_arg(args.into_iter()).unwrap(), "2025-10");
    }
}
