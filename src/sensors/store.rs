use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{SensorCredentials, SensorReading};

/// A reading about to be persisted. `recorded_at: None` lets the database
/// stamp the receipt time.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub sensor_id: Uuid,
    pub user_id: Uuid,
    pub value: f64,
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Queries for the sensor and reading tables.
///
/// Lookups run with the service's own connection, so they see every row
/// regardless of which account owns it. Device calls are anonymous; the API
/// key is the only credential.
#[derive(Clone)]
pub struct SensorStore {
    pool: PgPool,
}

impl SensorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve an API key to the owning sensor. `None` means the key matches
    /// no sensor and the caller must treat the request as unauthenticated.
    pub async fn find_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<SensorCredentials>, sqlx::Error> {
        sqlx::query_as::<_, SensorCredentials>(
            r#"
            SELECT id, user_id, name, alert_upper_threshold, alert_lower_threshold
            FROM sensors
            WHERE api_key = $1
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Persist one immutable reading and return the stored row, including the
    /// generated id and the normalized `recorded_at`.
    pub async fn insert_reading(&self, new: &NewReading) -> Result<SensorReading, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (sensor_id, user_id, value, recorded_at)
            VALUES ($1, $2, $3, COALESCE($4, now()))
            RETURNING id, sensor_id, user_id, value, recorded_at, created_at
            "#,
        )
        .bind(new.sensor_id)
        .bind(new.user_id)
        .bind(new.value)
        .bind(new.recorded_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Most recent readings for one sensor, newest first.
    pub async fn readings_for_sensor(
        &self,
        sensor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SensorReading>, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, user_id, value, recorded_at, created_at
            FROM sensor_readings
            WHERE sensor_id = $1
            ORDER BY recorded_at DESC
            LIMIT $2
            "#,
        )
        .bind(sensor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::*;

    async fn seed_account(pool: &PgPool, email: &str) -> Uuid {
        sqlx::query_scalar("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    /// Returns `(sensor_id, api_key)`.
    async fn seed_sensor(pool: &PgPool, user_id: Uuid, name: &str) -> (Uuid, String) {
        sqlx::query_as(
            "INSERT INTO sensors (user_id, name) VALUES ($1, $2) RETURNING id, api_key",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn find_by_api_key_resolves_sensor(pool: PgPool) {
        let user_id = seed_account(&pool, "owner@example.com").await;
        let (sensor_id, api_key) = seed_sensor(&pool, user_id, "greenhouse").await;

        let store = SensorStore::new(pool);
        let sensor = store.find_by_api_key(&api_key).await.unwrap().unwrap();

        assert_eq!(sensor.id, sensor_id);
        assert_eq!(sensor.user_id, user_id);
        assert_eq!(sensor.name, "greenhouse");
        assert!(sensor.alert_upper_threshold.is_none());
        assert!(sensor.alert_lower_threshold.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn find_by_api_key_unknown_returns_none(pool: PgPool) {
        let store = SensorStore::new(pool);
        let sensor = store.find_by_api_key("not-a-key").await.unwrap();
        assert!(sensor.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn insert_reading_defaults_recorded_at_to_now(pool: PgPool) {
        let user_id = seed_account(&pool, "owner@example.com").await;
        let (sensor_id, _) = seed_sensor(&pool, user_id, "greenhouse").await;

        let store = SensorStore::new(pool);
        let before = Utc::now();
        let reading = store
            .insert_reading(&NewReading {
                sensor_id,
                user_id,
                value: 23.5,
                recorded_at: None,
            })
            .await
            .unwrap();

        assert_eq!(reading.sensor_id, sensor_id);
        assert_eq!(reading.value, 23.5);
        assert!(reading.recorded_at >= before - Duration::seconds(1));
        assert!(reading.recorded_at <= Utc::now() + Duration::seconds(1));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn insert_reading_keeps_supplied_recorded_at(pool: PgPool) {
        let user_id = seed_account(&pool, "owner@example.com").await;
        let (sensor_id, _) = seed_sensor(&pool, user_id, "greenhouse").await;

        let supplied = Utc::now() - Duration::hours(3);
        let store = SensorStore::new(pool);
        let reading = store
            .insert_reading(&NewReading {
                sensor_id,
                user_id,
                value: 7.0,
                recorded_at: Some(supplied),
            })
            .await
            .unwrap();

        // Postgres keeps microsecond precision; allow for the truncation.
        assert!((reading.recorded_at - supplied).abs() < Duration::milliseconds(1));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn readings_for_sensor_newest_first_and_limited(pool: PgPool) {
        let user_id = seed_account(&pool, "owner@example.com").await;
        let (sensor_id, _) = seed_sensor(&pool, user_id, "greenhouse").await;

        let store = SensorStore::new(pool);
        for i in 0..5 {
            store
                .insert_reading(&NewReading {
                    sensor_id,
                    user_id,
                    value: f64::from(i),
                    recorded_at: Some(Utc::now() - Duration::minutes(i64::from(10 - i))),
                })
                .await
                .unwrap();
        }

        let rows = store.readings_for_sensor(sensor_id, 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].recorded_at >= rows[1].recorded_at);
        assert!(rows[1].recorded_at >= rows[2].recorded_at);
        assert_eq!(rows[0].value, 4.0);
    }
}
