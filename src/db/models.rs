use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The slice of a sensor row the ingestion path needs after API-key lookup.
/// Deliberately excludes the key itself so it cannot leak into logs or
/// responses; the display-settings columns belong to the dashboard's CRUD
/// surface, not this service.
#[derive(Debug, Clone, FromRow)]
pub struct SensorCredentials {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub alert_upper_threshold: Option<f64>,
    pub alert_lower_threshold: Option<f64>,
}

/// One immutable timestamped measurement.
///
/// `recorded_at` is the measurement time (device-supplied or receipt time);
/// `created_at` is always the insert time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub user_id: Uuid,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Ledger row recording one successfully delivered alert email.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sensor_id: Uuid,
    /// `threshold_upper` or `threshold_lower`.
    pub notification_type: String,
    pub threshold_value: f64,
    pub sensor_value: f64,
    pub sent_at: DateTime<Utc>,
}
