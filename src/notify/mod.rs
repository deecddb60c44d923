use std::time::Duration;
use reqwest::Client;
use crate::models::ScanSummary;
use tracing::{debug, info, warn};

const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Posts completed-scan summaries to a configured webhook. Delivery is
/// best-effort: failures are logged and never influence scan state.
pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self { client: Client::new(), webhook_url }
    }

    pub async fn notify_completed(&self, summary: &ScanSummary) {
        let Some(url) = &self.webhook_url else {
            debug!(scan_id = %summary.scan_id, "No webhook configured; skipping notification");
            return;
        };

        let result = self
            .client
            .post(url)
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .json(summary)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(scan_id = %summary.scan_id, "Completion notification delivered");
            }
            Ok(resp) => {
                warn!(scan_id = %summary.scan_id, status = %resp.status(), "Completion notification rejected");
            }
            Err(e) => {
                warn!(scan_id = %summary.scan_id, error = %e, "Completion notification failed");
            }
        }
    }
}
