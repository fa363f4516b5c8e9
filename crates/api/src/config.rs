use chrono_tz::Tz;
use taskdeck_core::query::EnabledFilters;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Reference time zone for the `today`/`upcoming`/`past` due-date
    /// windows. Deployment-wide for now; no per-user zone is stored.
    pub timezone: Tz,
    /// Named filters this deployment accepts (`completed` always included).
    pub enabled_filters: EnabledFilters,
    /// Mark the session cookie `Secure` (set when serving over HTTPS).
    pub cookie_secure: bool,
    /// Session token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8080`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `TASKS_TIMEZONE`       | `America/Vancouver`     |
    /// | `TASK_FILTERS`         | all named filters       |
    /// | `COOKIE_SECURE`        | `false`                 |
    ///
    /// # Panics
    ///
    /// Panics on malformed values; misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let timezone: Tz = std::env::var("TASKS_TIMEZONE")
            .unwrap_or_else(|_| "America/Vancouver".into())
            .parse()
            .expect("TASKS_TIMEZONE must be a valid IANA time zone name");

        let enabled_filters = match std::env::var("TASK_FILTERS") {
            Ok(list) => EnabledFilters::parse(&list)
                .expect("TASK_FILTERS must be a comma-separated list of known filters"),
            Err(_) => EnabledFilters::all(),
        };

        let cookie_secure: bool = std::env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("COOKIE_SECURE must be true or false");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            timezone,
            enabled_filters,
            cookie_secure,
            jwt,
        }
    }
}
