use std::sync::Arc;

use sqlx::PgPool;

use crate::alerts::AlertDispatcher;
use crate::config::Config;
use crate::notify::NotificationClient;
use crate::sensors::SensorStore;

/// Shared application state, cheap to clone into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SensorStore,
    pub dispatcher: AlertDispatcher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        let notifier = config.notification_credentials.as_ref().map(|creds| {
            NotificationClient::new(creds, &config.notification_base_url, &config.site_url)
        });
        let dispatcher = AlertDispatcher::new(
            pool.clone(),
            notifier,
            config.notification_cooldown_minutes,
        );

        Self {
            store: SensorStore::new(pool),
            dispatcher,
            config,
        }
    }
}
