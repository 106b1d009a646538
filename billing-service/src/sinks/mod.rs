pub mod alert_dispatch;
pub mod notifier;
pub mod webhook;

use std::{sync::Arc, time::Duration};

pub use alert_dispatch::{AlertDispatcher, DispatchOutcome};
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use webhook::WebhookNotifier;

use crate::config::{NotifierConfig, NotifierKind};

/// Build the notifier selected in configuration.
pub fn notifier_from_config(cfg: &NotifierConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match cfg.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Webhook => {
            let url = cfg
                .webhook_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("notifier.webhook_url is required for kind = \"webhook\""))?;
            let notifier = WebhookNotifier::new(url, Duration::from_millis(cfg.timeout_ms))?;
            Ok(Arc::new(notifier))
        }
    }
}
