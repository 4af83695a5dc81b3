use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use super::dto::{
    AcceptedReading, IngestRequest, IngestResponse, ReadingListResponse, SendNotificationRequest,
    StoredReading,
};
use super::errors::{AppError, AppResult};
use crate::alerts::{evaluate, Breach, DispatchError, DispatchOutcome, ThresholdAlert, ThresholdKind};
use crate::db::models::SensorCredentials;
use crate::sensors::NewReading;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReadingQuery {
    pub sensor_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Default page size for `GET /sensor-data`.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for `GET /sensor-data`.
const MAX_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Store one device reading, then evaluate thresholds and dispatch an alert
/// email best-effort.
///
/// Success is defined solely by the reading being persisted; every
/// notification-path outcome is advisory and never changes the response.
#[utoipa::path(
    post,
    path = "/sensor-data",
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Missing or non-numeric value"),
        (status = 401, description = "Missing, malformed or unknown API key"),
        (status = 500, description = "Reading could not be stored"),
    ),
    tag = "ingest"
)]
pub async fn ingest_reading(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<IngestResponse>)> {
    let api_key = bearer_token(&headers).ok_or(AppError::Unauthenticated(
        "Missing or invalid Authorization header",
    ))?;

    let req: IngestRequest = serde_json::from_value(body)
        .map_err(|e| AppError::InvalidInput(format!("value must be a number: {e}")))?;
    if !req.value.is_finite() {
        return Err(AppError::InvalidInput("value must be a finite number".into()));
    }

    let sensor = state
        .store
        .find_by_api_key(api_key)
        .await?
        .ok_or(AppError::Unauthenticated("Invalid API key"))?;

    // An unparseable device timestamp falls back to receipt time rather than
    // rejecting the reading.
    let recorded_at = req.timestamp.as_deref().and_then(parse_timestamp);

    let reading = state
        .store
        .insert_reading(&NewReading {
            sensor_id: sensor.id,
            user_id: sensor.user_id,
            value: req.value,
            recorded_at,
        })
        .await?;

    // The reading is stored; from here on nothing may change the response.
    if let Some(breach) = evaluate(
        req.value,
        sensor.alert_upper_threshold,
        sensor.alert_lower_threshold,
    ) {
        dispatch_best_effort(&state, &sensor, req.value, breach).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            data: AcceptedReading {
                id: reading.id,
                sensor_id: sensor.id,
                sensor_name: sensor.name,
                value: reading.value,
                timestamp: reading.recorded_at,
            },
        }),
    ))
}

/// Fetch recent readings for one sensor, newest first. Debugging aid for
/// device installations.
#[utoipa::path(
    get,
    path = "/sensor-data",
    params(
        ("sensor_id" = Uuid, Query, description = "Sensor to list readings for"),
        ("limit" = Option<i64>, Query, description = "Maximum number of readings (default 50, capped at 500)"),
    ),
    responses(
        (status = 200, description = "Recent readings, newest first", body = ReadingListResponse),
        (status = 400, description = "sensor_id parameter missing"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "ingest"
)]
pub async fn get_sensor_data(
    State(state): State<AppState>,
    Query(params): Query<ReadingQuery>,
) -> AppResult<Json<ReadingListResponse>> {
    let sensor_id = params
        .sensor_id
        .ok_or_else(|| AppError::InvalidInput("sensor_id parameter is required".into()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let rows = state.store.readings_for_sensor(sensor_id, limit).await?;
    Ok(Json(ReadingListResponse {
        data: rows.into_iter().map(StoredReading::from).collect(),
    }))
}

// ---------------------------------------------------------------------------
// Internal notification dispatch
// ---------------------------------------------------------------------------

/// Dispatch one threshold-alert email on behalf of another service.
///
/// Guarded by the internal shared secret, which is checked before the body
/// is even looked at.
#[utoipa::path(
    post,
    path = "/send-notification",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification sent"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Internal key mismatch"),
        (status = 429, description = "Owner is inside the cooldown window"),
        (status = 500, description = "Provider unconfigured or send failed"),
    ),
    tag = "alerts"
)]
pub async fn send_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Response> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthenticated("Unauthorized"))?;
    if token != state.config.internal_api_key {
        return Err(AppError::Unauthenticated("Unauthorized"));
    }

    let req: SendNotificationRequest = serde_json::from_value(body)
        .map_err(|e| AppError::InvalidInput(format!("invalid request body: {e}")))?;

    let alert = ThresholdAlert {
        user_id: req.user_id,
        sensor_id: req.sensor_id,
        sensor_name: req.sensor_name.unwrap_or_else(|| "Unknown sensor".to_owned()),
        current_value: req.current_value,
        threshold_value: req.threshold_value,
        kind: req.threshold_type,
        user_email: req.user_email,
    };

    match state.dispatcher.dispatch(&alert).await {
        Ok(DispatchOutcome::Sent) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Notification sent successfully",
            })),
        )
            .into_response()),
        Ok(DispatchOutcome::RateLimited) => Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "message": "Notification rate limited",
                "details": format!(
                    "Maximum 1 email per {} minutes per user",
                    state.dispatcher.cooldown_minutes()
                ),
            })),
        )
            .into_response()),
        Ok(DispatchOutcome::Disabled) => Err(AppError::Internal(anyhow::anyhow!(
            "notification provider is not configured"
        ))),
        Err(DispatchError::Send(e)) => Err(AppError::Internal(e.context("failed to send notification"))),
        Err(DispatchError::Store(e)) => Err(AppError::Store(e)),
        Err(e @ DispatchError::RecipientUnresolvable(_)) => Err(AppError::Internal(e.into())),
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Liveness probe with the crate version.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "message": "MeasureMate API is running",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

async fn dispatch_best_effort(
    state: &AppState,
    sensor: &SensorCredentials,
    value: f64,
    breach: Breach,
) {
    match state.dispatcher.notify_breach(sensor, value, breach).await {
        Ok(DispatchOutcome::Sent) => {
            info!(sensor_id = %sensor.id, kind = %breach.kind, "Threshold alert dispatched");
        }
        Ok(DispatchOutcome::RateLimited) => {
            debug!(sensor_id = %sensor.id, "Threshold alert suppressed by rate limit");
        }
        Ok(DispatchOutcome::Disabled) => {
            debug!(sensor_id = %sensor.id, "Threshold breached but alert sending is disabled");
        }
        Err(e) => {
            warn!(sensor_id = %sensor.id, error = %e, "Threshold alert dispatch failed");
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(ingest_reading, get_sensor_data, send_notification, health),
    components(schemas(
        IngestRequest,
        IngestResponse,
        AcceptedReading,
        ReadingListResponse,
        StoredReading,
        SendNotificationRequest,
        ThresholdKind,
    )),
    tags(
        (name = "ingest",  description = "Device-facing ingestion endpoints"),
        (name = "alerts",  description = "Internal alert dispatch endpoints"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "MeasureMate API",
        version = "0.1.0",
        description = "Sensor ingestion and threshold alerting for the MeasureMate dashboard"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
