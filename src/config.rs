use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "database_url must not be empty"))]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Minimum number of pooled database connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Deployment environment name ("development", "test", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            auto_migrate: false,
            environment,
            log_level: default_log_level(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/default`, `config/{RUN_ENV}`, and
/// `APP`-prefixed environment variables, in that order of precedence.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let _ = fmt().with_env_filter(filter_directive).try_init();
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}
