//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("Config not initialized. Call atelier_common::config::init() first.")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at application startup, before any other code accesses config.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.gateway_port", 8081)?
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 5)?
        .set_default("auth.access_token_ttl_secs", 900)? // 15 min
        .set_default("limits.max_team_size", 6)?
        .set_default("limits.max_skills", 20)?
        .set_default("limits.max_skill_length", 50)?
        .set_default("limits.max_bio_length", 500)?
        .set_default("limits.max_team_description_length", 1000)?
        .set_default("limits.max_message_length", 2000)?
        .set_default("limits.activity_window", 100)?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (ATELIER__SERVER__HOST, ATELIER__DATABASE__URL, etc.)
        .add_source(
            config::Environment::with_prefix("ATELIER")
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
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL — `postgres://...` in production, `sqlite::memory:` for
    /// local experiments and tests.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret (HS256) — should be 256+ bits of entropy
    pub jwt_secret: String,
    /// Access token TTL in seconds
    pub access_token_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Soft cap on team size — advisory, surfaced to clients, never
    /// hard-enforced by the engine.
    pub max_team_size: u32,
    pub max_skills: u32,
    pub max_skill_length: u32,
    pub max_bio_length: u32,
    pub max_team_description_length: u32,
    pub max_message_length: u32,
    /// Bounded window for activity-history reconstruction.
    pub activity_window: u32,
}
