//! Application configuration loaded from environment variables and config files.
//!
//! Config precedence: env vars > `.env` file > `config.toml` > defaults.

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("config not initialized — call ids_common::config::init() first")
}

/// Initialize the global configuration. Should be called once at startup.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.gateway_port", 8081)?
        .set_default("server.voice_port", 8082)?
        .set_default("database.url", "sqlite://ids.db")?
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 5)?
        .set_default("auth.jwt_secret", "dev-only-insecure-secret")?
        .set_default("limits.rate_limit_window_secs", 60)?
        .set_default("limits.rate_limit_cap", 10)?
        .set_default("limits.typing_expire_secs", 8)?
        .set_default("limits.voice_heartbeat_timeout_secs", 45)?
        .set_default("limits.gateway_ping_secs", 30)?
        .set_default("limits.lockdown_bypass_level", 90)?
        .set_default("limits.lockdown_unsubscribe_threshold", 90)?
        .set_default("limits.secure_view_logs_level", 70)?
        .set_default("limits.secure_trigger_lockdown_level", 80)?
        .set_default("limits.secure_delete_review_level", 70)?
        .set_default("limits.secure_rate_limit_threshold", 70)?
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("IDS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub gateway_port: u16,
    pub voice_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `postgres://…` or `sqlite://…` — backend is auto-detected from the scheme.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared signing secret used to *verify* bearer credentials (HS256-equivalent).
    /// Issuance lives outside this crate.
    pub jwt_secret: String,
}

/// Thresholds and windows for the rule engine (C3) and rate limiter (C4).
/// These are global, not per-channel-type — see SPEC_FULL.md §9 Open Question (a).
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub rate_limit_window_secs: u64,
    pub rate_limit_cap: u32,
    pub typing_expire_secs: u64,
    pub voice_heartbeat_timeout_secs: u64,
    pub gateway_ping_secs: u64,
    /// Security level at/above which lockdown no longer blocks an action.
    pub lockdown_bypass_level: i32,
    /// Security level below which a lockdown force-unsubscribes a subscriber.
    pub lockdown_unsubscribe_threshold: i32,
    pub secure_view_logs_level: i32,
    pub secure_trigger_lockdown_level: i32,
    pub secure_delete_review_level: i32,
    pub secure_rate_limit_threshold: i32,
}
