use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_PAYMENT_EXPIRY_MINUTES: i64 = 10;
const DEFAULT_PAYMENT_CONFIRMATION_MINUTES: i64 = 24 * 60;
const DEFAULT_MIN_SHIPMENT_DISTANCE_KM: i64 = 1;
const DEFAULT_MAX_SHIPMENT_PRICE: i64 = 1_000_000;
const DEFAULT_IN_HOUSE_MAX_METHOD_ID: i32 = 2;
const DEFAULT_RATE_API_BASE_URL: &str = "https://api.rajaongkir.com/starter";

/// Shipment pricing configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShipmentConfig {
    /// Distances below this floor are charged as this many kilometers
    #[serde(default = "default_min_distance_km")]
    #[validate(custom = "validate_non_negative")]
    pub min_distance_km: i64,

    /// In-house shipment prices above this value are clamped to zero
    #[serde(default = "default_max_shipment_price")]
    #[validate(custom = "validate_non_negative")]
    pub max_price: i64,

    /// Shipment method ids up to and including this one are in-house couriers
    #[serde(default = "default_in_house_max_method_id")]
    pub in_house_max_method_id: i32,

    /// Base URL of the third-party courier rate API
    #[serde(default = "default_rate_api_base_url")]
    pub rate_api_base_url: String,

    /// API key sent with every rate quote request
    #[serde(default)]
    pub rate_api_key: String,

    /// Timeout for a single rate quote request
    #[serde(default = "default_rate_api_timeout_secs")]
    pub rate_api_timeout_secs: u64,
}

impl Default for ShipmentConfig {
    fn default() -> Self {
        Self {
            min_distance_km: default_min_distance_km(),
            max_price: default_max_shipment_price(),
            in_house_max_method_id: default_in_house_max_method_id(),
            rate_api_base_url: default_rate_api_base_url(),
            rate_api_key: String::new(),
            rate_api_timeout_secs: default_rate_api_timeout_secs(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for async notification processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Minutes a fresh payment stays open before it expires
    #[serde(default = "default_payment_expiry_minutes")]
    #[validate(custom = "validate_positive_minutes")]
    pub payment_expiry_minutes: i64,

    /// Minutes an uploaded proof waits for admin confirmation
    #[serde(default = "default_payment_confirmation_minutes")]
    #[validate(custom = "validate_positive_minutes")]
    pub payment_confirmation_minutes: i64,

    /// Shipment pricing
    #[serde(default)]
    #[validate]
    pub shipment: ShipmentConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            payment_expiry_minutes: default_payment_expiry_minutes(),
            payment_confirmation_minutes: default_payment_confirmation_minutes(),
            shipment: ShipmentConfig::default(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn payment_expiry(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.payment_expiry_minutes)
    }

    pub fn payment_confirmation_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.payment_confirmation_minutes)
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_payment_expiry_minutes() -> i64 {
    DEFAULT_PAYMENT_EXPIRY_MINUTES
}

fn default_payment_confirmation_minutes() -> i64 {
    DEFAULT_PAYMENT_CONFIRMATION_MINUTES
}

fn default_min_distance_km() -> i64 {
    DEFAULT_MIN_SHIPMENT_DISTANCE_KM
}

fn default_max_shipment_price() -> i64 {
    DEFAULT_MAX_SHIPMENT_PRICE
}

fn default_in_house_max_method_id() -> i32 {
    DEFAULT_IN_HOUSE_MAX_METHOD_ID
}

fn default_rate_api_base_url() -> String {
    DEFAULT_RATE_API_BASE_URL.to_string()
}

fn default_rate_api_timeout_secs() -> u64 {
    10
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive_minutes(minutes: i64) -> Result<(), ValidationError> {
    if minutes <= 0 {
        let mut err = ValidationError::new("minutes");
        err.message = Some("must be at least one minute".into());
        return Err(err);
    }
    Ok(())
}

fn validate_non_negative(value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("pharmahub_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    load_config_from(CONFIG_DIR, &run_env)
}

fn load_config_from(config_dir: &str, run_env: &str) -> Result<AppConfig, AppConfigError> {
    if !Path::new(config_dir).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://pharmahub.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
        .add_source(File::with_name(&format!("{}/{}", config_dir, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[test]
    fn defaults_pass_validation() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.payment_expiry(), chrono::Duration::minutes(10));
        assert_eq!(cfg.shipment.in_house_max_method_id, 2);
    }

    #[test]
    fn zero_payment_expiry_is_rejected() {
        let mut cfg = base_config();
        cfg.payment_expiry_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_shipment_floor_is_rejected() {
        let mut cfg = base_config();
        cfg.shipment.min_distance_km = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut cfg = base_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn permissive_cors_only_in_development_or_opt_in() {
        let mut cfg = base_config();
        assert!(!cfg.should_allow_permissive_cors());
        cfg.cors_allow_any_origin = true;
        assert!(cfg.should_allow_permissive_cors());
        cfg.cors_allow_any_origin = false;
        cfg.environment = "development".into();
        assert!(cfg.should_allow_permissive_cors());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            database_url = "postgres://localhost/pharmahub"
            payment_expiry_minutes = 15

            [shipment]
            min_distance_km = 2
            max_price = 250000
            "#
        )
        .unwrap();

        let dir_str = dir.path().to_str().unwrap().to_string();
        let cfg = load_config_from(&dir_str, "test").unwrap();
        assert_eq!(cfg.database_url, "postgres://localhost/pharmahub");
        assert_eq!(cfg.payment_expiry_minutes, 15);
        assert_eq!(cfg.shipment.min_distance_km, 2);
        assert_eq!(cfg.shipment.max_price, 250_000);
        assert_eq!(cfg.port, 8080);
    }
}
