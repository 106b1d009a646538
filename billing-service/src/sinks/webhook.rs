use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use super::notifier::{Notifier, NotifyError};

#[derive(Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

/// POSTs `{"subject", "message"}` JSON to a fixed URL.
///
/// A single attempt per call; any retry policy belongs to the receiver.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                subject,
                message: body,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("webhook returned {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use std::{net::SocketAddr, sync::Arc};
    use tokio::sync::Mutex;

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn accept(State(received): State<Received>, Json(body): Json<serde_json::Value>) -> StatusCode {
        received.lock().await.push(body);
        StatusCode::OK
    }

    /// Local receiver: `/hook` records bodies, `/unavailable` always answers 503.
    async fn spawn_receiver() -> (SocketAddr, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route("/hook", post(accept))
            .route("/unavailable", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        (addr, received)
    }

    #[tokio::test]
    async fn posts_subject_and_message_as_json() {
        let (addr, received) = spawn_receiver().await;
        let notifier = WebhookNotifier::new(format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();

        notifier
            .publish("Billing Anomalies Detected in snap.csv", "line one\nline two")
            .await
            .unwrap();

        let bodies = received.lock().await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            serde_json::json!({
                "subject": "Billing Anomalies Detected in snap.csv",
                "message": "line one\nline two",
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (addr, _) = spawn_receiver().await;
        let notifier = WebhookNotifier::new(format!("http://{addr}/unavailable"), Duration::from_secs(5)).unwrap();

        let res = notifier.publish("s", "b").await;
        assert!(matches!(res, Err(NotifyError::Rejected(ref m)) if m.contains("503")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = WebhookNotifier::new(format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();
        let res = notifier.publish("s", "b").await;
        assert!(matches!(res, Err(NotifyError::Transport(_))));
    }
}
