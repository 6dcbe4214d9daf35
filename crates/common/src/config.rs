//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Moderation policy configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Polling synchronization configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Moderation policy configuration.
///
/// The staleness threshold and requester-closure rules are policy, not
/// hard-coded behavior; tests parameterize over them.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Minutes of moderator inactivity before an assigned ticket is
    /// escalated to the admin pool on the next read.
    #[serde(default = "default_staleness_minutes")]
    pub staleness_minutes: i64,
    /// Whether a requester may close a ticket that has been escalated.
    #[serde(default = "default_true")]
    pub requester_may_close_escalated: bool,
    /// Upper bound for temporary suspensions, in days.
    #[serde(default = "default_max_suspension_days")]
    pub max_suspension_days: i64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            staleness_minutes: default_staleness_minutes(),
            requester_may_close_escalated: default_true(),
            max_suspension_days: default_max_suspension_days(),
        }
    }
}

/// Polling synchronization configuration.
///
/// There is no push channel; these intervals are the server-owned
/// contract clients poll at. A state change is visible within one
/// interval plus processing latency.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Notification list polling interval, in seconds.
    #[serde(default = "default_notification_interval")]
    pub notification_interval_secs: u64,
    /// Ticket / active-chat polling interval, in seconds.
    #[serde(default = "default_ticket_interval")]
    pub ticket_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            notification_interval_secs: default_notification_interval(),
            ticket_interval_secs: default_ticket_interval(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_staleness_minutes() -> i64 {
    30
}

const fn default_max_suspension_days() -> i64 {
    365
}

const fn default_true() -> bool {
    true
}

const fn default_notification_interval() -> u64 {
    3
}

const fn default_ticket_interval() -> u64 {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `WORKLINK_ENV`)
    /// 3. Environment variables with `WORKLINK_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("WORKLINK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WORKLINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("WORKLINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderation_defaults() {
        let config = ModerationConfig::default();
        assert_eq!(config.staleness_minutes, 30);
        assert!(config.requester_may_close_escalated);
        assert_eq!(config.max_suspension_days, 365);
    }

    #[test]
    fn test_sync_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.notification_interval_secs, 3);
        assert_eq!(config.ticket_interval_secs, 5);
    }
}
