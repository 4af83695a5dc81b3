pub mod models;

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::alerts::ThresholdAlert;
use crate::config::NotificationCredentials;

use self::models::SendRequest;

/// Client for the outbound email-notification provider.
///
/// Cheap to clone; the underlying HTTP client and credentials are shared.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    site_url: String,
}

impl NotificationClient {
    pub fn new(creds: &NotificationCredentials, base_url: &str, site_url: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                client_id: creds.client_id.clone(),
                client_secret: creds.client_secret.clone(),
                site_url: site_url.to_owned(),
            }),
        }
    }

    /// Deliver one threshold-alert email. Success means the provider accepted
    /// the request; mailbox delivery is the provider's concern.
    pub async fn send_threshold_alert(&self, alert: &ThresholdAlert) -> Result<()> {
        let body = SendRequest::threshold_alert(alert, &self.inner.site_url);
        let url = format!("{}/{}/sender", self.inner.base_url, self.inner.client_id);
        debug!(user_id = %alert.user_id, sensor_id = %alert.sensor_id, "Posting alert to notification provider");

        self.inner
            .http
            .post(&url)
            .basic_auth(&self.inner.client_id, Some(&self.inner.client_secret))
            .json(&body)
            .send()
            .await
            .context("notification send request failed")?
            .error_for_status()
            .context("notification provider returned error status")?;

        Ok(())
    }
}
