//! Notification channel used to deliver anomaly alerts.

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(String),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes alerts to the log instead of delivering them anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::warn!(subject, lines = body.lines().count(), "{body}");
        Ok(())
    }
}
