use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::{
    sinks::alert_dispatch::DEFAULT_SUBJECT_PREFIX,
    transform::{
        anomaly::{DEFAULT_HIGH_CONSUMPTION_FACTOR, DEFAULT_SUB_METER_SPIKE_THRESHOLD},
        normalize::DEFAULT_DATE_COLUMN,
        RuleThresholds,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory acting as the snapshot bucket.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub date_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyScanConfig {
    pub prefix: String,
    pub high_consumption_factor: f64,
    pub sub_meter_spike_threshold: f64,
    pub subject_prefix: String,
}

impl Default for AnomalyScanConfig {
    fn default() -> Self {
        Self {
            prefix: "data/billing_agg_".to_string(),
            high_consumption_factor: DEFAULT_HIGH_CONSUMPTION_FACTOR,
            sub_meter_spike_threshold: DEFAULT_SUB_METER_SPIKE_THRESHOLD,
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }
}

impl AnomalyScanConfig {
    pub fn thresholds(&self) -> RuleThresholds {
        RuleThresholds {
            high_consumption_factor: self.high_consumption_factor,
            sub_meter_spike_threshold: self.sub_meter_spike_threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonthlyQueryConfig {
    pub prefix: String,
}

impl Default for MonthlyQueryConfig {
    fn default() -> Self {
        Self {
            prefix: "data/billing_agg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: None,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub anomaly_scan: AnomalyScanConfig,
    #[serde(default)]
    pub monthly_query: MonthlyQueryConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    pub server: Option<ServerConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("BILLING_CONFIG").unwrap_or_else(|_| "billing-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.dataset.date_column.trim().is_empty() {
            anyhow::bail!("dataset.date_column must not be empty");
        }
        let scan = &self.anomaly_scan;
        if !(scan.high_consumption_factor.is_finite() && scan.high_consumption_factor > 0.0) {
            anyhow::bail!("anomaly_scan.high_consumption_factor must be a positive number");
        }
        if !scan.sub_meter_spike_threshold.is_finite() {
            anyhow::bail!("anomaly_scan.sub_meter_spike_threshold must be a finite number");
        }
        if self.notifier.kind == NotifierKind::Webhook && self.notifier.webhook_url.is_none() {
            anyhow::bail!("notifier.webhook_url is required for kind = \"webhook\"");
        }
        Ok(())
    }
}
