//! The two invocation entry points: anomaly scan and monthly query.
//!
//! Each entry point catches every error and turns it into an
//! [`InvocationResponse`]; nothing escapes to the caller.

use std::sync::Arc;

use billing_client::{FsObjectStore, ObjectStore};
use serde::Serialize;
use serde_json::json;

use crate::{
    config::{AnomalyScanConfig, AppConfig, MonthlyQueryConfig},
    pipeline::{self, PipelineError},
    sinks::{self, AlertDispatcher, DispatchOutcome, Notifier},
    transform::{self, MonthlyRow, NormalizeOptions, YearMonth},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    SchemaError,
    InternalError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::SchemaError => 422,
            Status::InternalError => 500,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::BadRequest => "bad_request",
            Status::NotFound => "not_found",
            Status::SchemaError => "schema_error",
            Status::InternalError => "internal_error",
        }
    }
}

impl From<&PipelineError> for Status {
    fn from(e: &PipelineError) -> Self {
        match e {
            PipelineError::NotFound(_) => Status::NotFound,
            PipelineError::Schema(_) => Status::SchemaError,
            PipelineError::Validation(_) => Status::BadRequest,
            PipelineError::Internal(_) => Status::InternalError,
        }
    }
}

/// Transport-neutral response: a status plus a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResponse {
    pub status: Status,
    pub body: serde_json::Value,
}

impl InvocationResponse {
    fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self {
                status: Status::Ok,
                body,
            },
            Err(e) => Self {
                status: Status::InternalError,
                body: json!({ "error": format!("failed to serialize response: {e}") }),
            },
        }
    }

    fn error(e: &PipelineError) -> Self {
        Self {
            status: Status::from(e),
            body: json!({ "error": e.message() }),
        }
    }
}

/// Response body of a successful anomaly scan.
///
/// The alerts themselves only go to the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub message: String,
    pub file_processed: String,
    pub records_analyzed: usize,
    pub alerts_found: usize,
    pub dispatch: DispatchOutcome,
}

pub struct BillingService {
    store: Arc<dyn ObjectStore>,
    dispatcher: AlertDispatcher,
    date_column: String,
    scan: AnomalyScanConfig,
    query: MonthlyQueryConfig,
}

impl BillingService {
    pub fn new(store: Arc<dyn ObjectStore>, notifier: Arc<dyn Notifier>, cfg: &AppConfig) -> Self {
        Self {
            store,
            dispatcher: AlertDispatcher::new(notifier, cfg.anomaly_scan.subject_prefix.clone()),
            date_column: cfg.dataset.date_column.clone(),
            scan: cfg.anomaly_scan.clone(),
            query: cfg.monthly_query.clone(),
        }
    }

    /// Directory-backed store and the configured notifier.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(FsObjectStore::new(cfg.store.root.clone()));
        let notifier = sinks::notifier_from_config(&cfg.notifier)?;
        Ok(Self::new(store, notifier, cfg))
    }

    pub async fn anomaly_scan(&self) -> InvocationResponse {
        let response = match self.run_anomaly_scan().await {
            Ok(report) => InvocationResponse::ok(&report),
            Err(e) => {
                tracing::error!(error = %e, "anomaly scan failed");
                InvocationResponse::error(&e)
            }
        };
        record_invocation("anomaly_scan", response.status);
        response
    }

    /// Select, normalize, evaluate rules, dispatch.
    ///
    /// A dispatch failure is carried in the report and never turns a
    /// completed detection into an error.
    pub async fn run_anomaly_scan(&self) -> Result<ScanReport, PipelineError> {
        let options = NormalizeOptions {
            date_column: self.date_column.clone(),
            require_dated_rows: false,
        };
        let loaded = pipeline::load_latest_dataset(self.store.as_ref(), &self.scan.prefix, &options).await?;
        let records = &loaded.dataset.records;

        let alerts = transform::detect_anomalies(records, &self.scan.thresholds());
        metrics::counter!("anomaly_alerts_total").increment(alerts.len() as u64);
        tracing::info!(key = %loaded.snapshot.key, records = records.len(), alerts = alerts.len(), "anomaly rules evaluated");

        let dispatch = self.dispatcher.dispatch(&loaded.snapshot.key, &alerts).await;

        Ok(ScanReport {
            message: "Processing complete.".to_string(),
            file_processed: loaded.snapshot.key,
            records_analyzed: records.len(),
            alerts_found: alerts.len(),
            dispatch,
        })
    }

    pub async fn monthly_query(&self, month: Option<&str>) -> InvocationResponse {
        let response = match self.run_monthly_query(month).await {
            Ok(rows) => InvocationResponse::ok(&rows),
            Err(e @ PipelineError::Internal(_)) => {
                tracing::error!(error = %e, "monthly query failed");
                InvocationResponse {
                    status: Status::InternalError,
                    body: json!({ "error": "Internal server error", "details": e.message() }),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, ?month, "monthly query rejected");
                InvocationResponse::error(&e)
            }
        };
        record_invocation("monthly_query", response.status);
        response
    }

    /// Validate the month, then select, normalize and filter.
    ///
    /// The month is checked before the store is touched. Unlike the anomaly
    /// scan, a snapshot with no valid dates is a schema error here.
    pub async fn run_monthly_query(&self, month: Option<&str>) -> Result<Vec<MonthlyRow>, PipelineError> {
        let month: YearMonth = month
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Validation("Month parameter is required, e.g., ?month=2025-10".to_string())
            })?
            .parse()?;

        let options = NormalizeOptions {
            date_column: self.date_column.clone(),
            require_dated_rows: true,
        };
        let loaded = pipeline::load_latest_dataset(self.store.as_ref(), &self.query.prefix, &options).await?;

        let rows = transform::select_month(&loaded.dataset.records, month)?;
        tracing::info!(key = %loaded.snapshot.key, %month, rows = rows.len(), "monthly query served");
        Ok(rows)
    }
}

fn record_invocation(entry: &'static str, status: Status) {
    metrics::counter!("billing_invocations_total", "entry" => entry, "status" => status.label()).increment(1);
}
