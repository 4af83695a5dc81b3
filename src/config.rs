use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// NotificationCredentials
// ---------------------------------------------------------------------------

/// Credentials for the outbound email-notification provider.
///
/// Both halves must be configured together; when the pair is absent the
/// service runs with alert sending disabled.
#[derive(Debug, Clone)]
pub struct NotificationCredentials {
    pub client_id: String,
    pub client_secret: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Base URL of the dashboard web app, used for links in alert emails.
    pub site_url: String,
    /// Shared secret guarding `POST /send-notification`.
    pub internal_api_key: String,
    /// Base URL of the notification provider's REST API.
    pub notification_base_url: String,
    /// `None` disables alert sending entirely; ingestion is unaffected.
    pub notification_credentials: Option<NotificationCredentials>,
    /// Minimum interval between two alert emails to the same owner.
    pub notification_cooldown_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            site_url: optional("SITE_URL", "http://localhost:3000"),
            internal_api_key: required("INTERNAL_API_KEY")?,
            notification_base_url: optional(
                "NOTIFICATIONAPI_BASE_URL",
                "https://api.notificationapi.com",
            ),
            notification_credentials: notification_credentials(
                std::env::var("NOTIFICATIONAPI_CLIENT_ID").ok(),
                std::env::var("NOTIFICATIONAPI_CLIENT_SECRET").ok(),
            )?,
            notification_cooldown_minutes: optional("NOTIFICATION_COOLDOWN_MINUTES", "30")
                .parse()
                .context("NOTIFICATION_COOLDOWN_MINUTES must be a positive integer")?,
        })
    }
}

/// Pair up the provider credentials. Exactly one half set is a configuration
/// mistake and refuses startup rather than silently disabling alerts.
fn notification_credentials(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<Option<NotificationCredentials>> {
    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(Some(NotificationCredentials {
            client_id,
            client_secret,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => {
            bail!("NOTIFICATIONAPI_CLIENT_ID is set but NOTIFICATIONAPI_CLIENT_SECRET is not")
        }
        (None, Some(_)) => {
            bail!("NOTIFICATIONAPI_CLIENT_SECRET is set but NOTIFICATIONAPI_CLIENT_ID is not")
        }
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
