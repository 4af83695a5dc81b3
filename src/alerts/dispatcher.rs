use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::SensorCredentials;
use crate::notify::NotificationClient;

use super::threshold::{Breach, ThresholdKind};

// ---------------------------------------------------------------------------
// Alert payload and outcomes
// ---------------------------------------------------------------------------

/// Everything needed to send one threshold-alert email.
#[derive(Debug, Clone)]
pub struct ThresholdAlert {
    pub user_id: Uuid,
    pub sensor_id: Uuid,
    pub sensor_name: String,
    pub current_value: f64,
    pub threshold_value: f64,
    pub kind: ThresholdKind,
    pub user_email: String,
}

/// Terminal states of a dispatch attempt that are NOT errors. Rate limiting
/// and disabled sending are expected operating conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The provider accepted the email.
    Sent,
    /// The owner already received an email inside the cooldown window.
    RateLimited,
    /// No provider credentials are configured; sending is switched off.
    Disabled,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no email address on record for account {0}")]
    RecipientUnresolvable(Uuid),
    #[error("alert bookkeeping failed")]
    Store(#[from] sqlx::Error),
    #[error("notification send failed")]
    Send(#[source] anyhow::Error),
}

// ---------------------------------------------------------------------------
// AlertDispatcher
// ---------------------------------------------------------------------------

/// Turns a threshold breach into at most one rate-limited email plus a
/// best-effort ledger row.
///
/// The rate limit lives in the database, not in process memory: the service
/// is stateless across requests and may run as several instances, so the
/// gate must be a single atomic statement against shared state.
#[derive(Clone)]
pub struct AlertDispatcher {
    pool: PgPool,
    notifier: Option<NotificationClient>,
    cooldown_minutes: i32,
}

impl AlertDispatcher {
    pub fn new(pool: PgPool, notifier: Option<NotificationClient>, cooldown_minutes: i32) -> Self {
        Self {
            pool,
            notifier,
            cooldown_minutes,
        }
    }

    pub fn cooldown_minutes(&self) -> i32 {
        self.cooldown_minutes
    }

    /// Resolve the owner's email address and dispatch an alert for `breach`.
    ///
    /// Callers on the ingestion path must treat every result as advisory:
    /// the reading is already stored and its response must not change.
    pub async fn notify_breach(
        &self,
        sensor: &SensorCredentials,
        value: f64,
        breach: Breach,
    ) -> Result<DispatchOutcome, DispatchError> {
        let email = self
            .owner_email(sensor.user_id)
            .await?
            .ok_or(DispatchError::RecipientUnresolvable(sensor.user_id))?;

        let alert = ThresholdAlert {
            user_id: sensor.user_id,
            sensor_id: sensor.id,
            sensor_name: sensor.name.clone(),
            current_value: value,
            threshold_value: breach.limit,
            kind: breach.kind,
            user_email: email,
        };
        self.dispatch(&alert).await
    }

    /// Send one alert email, subject to the per-owner cooldown gate.
    pub async fn dispatch(&self, alert: &ThresholdAlert) -> Result<DispatchOutcome, DispatchError> {
        let Some(notifier) = &self.notifier else {
            return Ok(DispatchOutcome::Disabled);
        };

        if !self.claim_send_slot(alert.user_id).await? {
            return Ok(DispatchOutcome::RateLimited);
        }

        notifier
            .send_threshold_alert(alert)
            .await
            .map_err(DispatchError::Send)?;

        info!(
            user_id = %alert.user_id,
            sensor_id = %alert.sensor_id,
            kind = %alert.kind,
            "Threshold alert email sent"
        );

        // The email is already out; a ledger failure must not resend it.
        if let Err(e) = self.record_notification(alert).await {
            warn!(
                user_id = %alert.user_id,
                sensor_id = %alert.sensor_id,
                error = %e,
                "Alert sent but ledger write failed"
            );
        }

        Ok(DispatchOutcome::Sent)
    }

    async fn owner_email(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT email FROM accounts WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Atomic check-and-mark: admits the caller and stamps the window start
    /// in one statement, so two near-simultaneous breaches for the same owner
    /// cannot both pass.
    async fn claim_send_slot(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let admitted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO notification_rate_limits AS rl (user_id, last_sent_at)
            VALUES ($1, now())
            ON CONFLICT (user_id) DO UPDATE
                SET last_sent_at = now()
                WHERE rl.last_sent_at <= now() - ($2 * interval '1 minute')
            RETURNING user_id
            "#,
        )
        .bind(user_id)
        .bind(self.cooldown_minutes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admitted.is_some())
    }

    async fn record_notification(&self, alert: &ThresholdAlert) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications
                (user_id, sensor_id, notification_type, threshold_value, sensor_value)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(alert.user_id)
        .bind(alert.sensor_id)
        .bind(alert.kind.ledger_type())
        .bind(alert.threshold_value)
        .bind(alert.current_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
