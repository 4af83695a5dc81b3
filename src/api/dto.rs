use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::alerts::ThresholdKind;
use crate::db::models::SensorReading;

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Request body for `POST /sensor-data`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// Measured value. Must be a finite number.
    pub value: f64,
    /// Measurement time (RFC3339). Unparseable or absent values fall back to
    /// the receipt time.
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub success: bool,
    pub data: AcceptedReading,
}

/// What the device gets back for a stored reading.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedReading {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub sensor_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reading listing
// ---------------------------------------------------------------------------

/// Response body for `GET /sensor-data`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingListResponse {
    pub data: Vec<StoredReading>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoredReading {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<SensorReading> for StoredReading {
    fn from(r: SensorReading) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            value: r.value,
            timestamp: r.recorded_at,
            created_at: r.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal notification dispatch
// ---------------------------------------------------------------------------

/// Request body for `POST /send-notification` (internal service calls).
/// Field names are the established camelCase wire format.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub user_id: Uuid,
    pub sensor_id: Uuid,
    pub sensor_name: Option<String>,
    pub current_value: f64,
    pub threshold_value: f64,
    pub threshold_type: ThresholdKind,
    pub user_email: String,
}
