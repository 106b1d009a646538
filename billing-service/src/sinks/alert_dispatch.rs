use std::sync::Arc;

use serde::Serialize;

use super::notifier::Notifier;
use crate::transform::Alert;

pub const DEFAULT_SUBJECT_PREFIX: &str = "Billing Anomalies Detected in";

/// What happened to the alert notification for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    /// No alerts, nothing published.
    Skipped,
    Failed(String),
}

/// Publishes a scan's alerts as a single notification.
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    subject_prefix: String,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, subject_prefix: impl Into<String>) -> Self {
        Self {
            notifier,
            subject_prefix: subject_prefix.into(),
        }
    }

    pub fn subject_for(&self, snapshot_key: &str) -> String {
        format!("{} {snapshot_key}", self.subject_prefix)
    }

    /// Publish `alerts` newline-joined, or do nothing when there are none.
    ///
    /// Failures are reported in the outcome, never retried here.
    pub async fn dispatch(&self, snapshot_key: &str, alerts: &[Alert]) -> DispatchOutcome {
        if alerts.is_empty() {
            tracing::info!(key = snapshot_key, "no anomalies detected");
            return DispatchOutcome::Skipped;
        }

        let body = alerts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        match self.notifier.publish(&self.subject_for(snapshot_key), &body).await {
            Ok(()) => {
                tracing::info!(key = snapshot_key, alerts = alerts.len(), "alerts dispatched");
                DispatchOutcome::Sent
            }
            Err(e) => {
                tracing::error!(key = snapshot_key, error = %e, "alert dispatch failed");
                metrics::counter!("alert_dispatch_failures_total").increment(1);
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sinks::NotifyError;
    use crate::transform::AlertKind;
    use time::macros::date;
    use tokio::sync::Mutex;

    /// Records every publish; optionally fails them all.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub published: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.published
                .lock()
                .await
                .push((subject.to_string(), body.to_string()));
            if self.fail {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_alerts_publishes_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::new(notifier.clone(), DEFAULT_SUBJECT_PREFIX);

        let outcome = dispatcher.dispatch("data/billing_agg_1.csv", &[]).await;

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(notifier.published.lock().await.is_empty());
    }

    #[tokio::test]
    async fn alerts_are_sent_as_one_message() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::new(notifier.clone(), DEFAULT_SUBJECT_PREFIX);
        let alerts = vec![
            Alert {
                date: date!(2025 - 10 - 01),
                kind: AlertKind::ZeroConsumption,
            },
            Alert {
                date: date!(2025 - 10 - 02),
                kind: AlertKind::ZeroConsumption,
            },
        ];

        let outcome = dispatcher.dispatch("snap.csv", &alerts).await;

        assert_eq!(outcome, DispatchOutcome::Sent);
        let published = notifier.published.lock().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "Billing Anomalies Detected in snap.csv");
        assert_eq!(
            published[0].1,
            "Zero consumption detected on 01-10-2025\nZero consumption detected on 02-10-2025"
        );
    }

    #[tokio::test]
    async fn publish_failure_is_reported_not_raised() {
        let dispatcher = AlertDispatcher::new(Arc::new(RecordingNotifier::failing()), DEFAULT_SUBJECT_PREFIX);
        let alerts = vec![Alert {
            date: date!(2025 - 10 - 01),
            kind: AlertKind::ZeroConsumption,
        }];

        let outcome = dispatcher.dispatch("snap.csv", &alerts).await;
        assert!(matches!(outcome, DispatchOutcome::Failed(ref m) if m.contains("connection refused")));
    }

    #[test]
    fn outcome_serializes_compactly() {
        assert_eq!(serde_json::to_string(&DispatchOutcome::Sent).unwrap(), "\"sent\"");
        assert_eq!(
            serde_json::to_string(&DispatchOutcome::Failed("x".into())).unwrap(),
            "{\"failed\":\"x\"}"
        );
    }
}
