use serde::Serialize;

use crate::alerts::{ThresholdAlert, ThresholdKind};

/// Provider-side template id for the threshold-alert email.
pub(crate) const THRESHOLD_ALERT_TEMPLATE: &str = "sensor_threshold_alert";

/// Request body for the provider's `POST /{client_id}/sender` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub notification_id: String,
    pub user: Recipient,
    pub merge_tags: MergeTags,
}

#[derive(Debug, Serialize)]
pub struct Recipient {
    pub id: String,
    pub email: String,
}

/// Template variables for the alert email. Field names are the provider-side
/// merge-tag names and must stay camelCase on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeTags {
    pub sensor_name: String,
    pub current_value: String,
    pub threshold_value: String,
    pub threshold_type_text: String,
    pub exceeds_text: String,
    pub alert_time: String,
    pub dashboard_url: String,
}

impl SendRequest {
    pub fn threshold_alert(alert: &ThresholdAlert, site_url: &str) -> Self {
        let (threshold_type_text, exceeds_text) = match alert.kind {
            ThresholdKind::Upper => ("upper threshold", "exceeded"),
            ThresholdKind::Lower => ("lower threshold", "dropped below"),
        };

        Self {
            notification_id: THRESHOLD_ALERT_TEMPLATE.to_owned(),
            user: Recipient {
                id: alert.user_id.to_string(),
                email: alert.user_email.clone(),
            },
            merge_tags: MergeTags {
                sensor_name: alert.sensor_name.clone(),
                current_value: alert.current_value.to_string(),
                threshold_value: alert.threshold_value.to_string(),
                threshold_type_text: threshold_type_text.to_owned(),
                exceeds_text: exceeds_text.to_owned(),
                alert_time: chrono::Utc::now().to_rfc3339(),
                dashboard_url: format!("{}/dashboard", site_url.trim_end_matches('/')),
            },
        }
    }
}
