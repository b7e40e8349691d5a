use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Signing key baked in for local development. Rejected outside the
/// development environment by [`AppConfig::validate_additional_constraints`].
const DEV_DEFAULT_JWT_SECRET: &str =
    "stockroom_local_development_signing_key_padded_out_to_meet_the_64_char_rule";

/// Placeholder secrets that must never make it past validation.
const PLACEHOLDER_SECRETS: [&str; 4] = [
    "CHANGE_THIS_SECRET_IN_PRODUCTION",
    "INSECURE_DEFAULT_DO_NOT_USE_IN_PRODUCTION",
    "your-secret-key",
    "default-secret-key",
];

const WEAK_SECRET_FRAGMENTS: [&str; 5] = ["changeme", "password", "default", "12345", "abcdef"];

/// Runtime settings, sourced from `config/*.toml` files and `APP__*`
/// environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Connection URL for the backing database.
    pub database_url: String,

    /// HS256 signing key for access and refresh tokens.
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    pub jwt_expiration: usize,

    /// Refresh token lifetime in seconds.
    pub refresh_token_expiration: usize,

    /// Interface the server binds to.
    pub host: String,

    #[serde(default = "port_default")]
    pub port: u16,

    /// Deployment environment name, e.g. `development` or `production`.
    pub environment: String,

    #[serde(default = "level_default")]
    pub log_level: String,

    /// Emit log lines as JSON instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,

    /// Apply pending migrations during startup.
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Opt into permissive CORS outside development.
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    #[serde(default = "pool_max_default")]
    pub db_max_connections: u32,

    #[serde(default = "pool_min_default")]
    pub db_min_connections: u32,

    #[serde(default = "connect_timeout_default")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "idle_timeout_default")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "acquire_timeout_default")]
    pub db_acquire_timeout_secs: u64,

    /// Buffer size of the domain event channel.
    #[serde(default = "event_capacity_default")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default = "issuer_default")]
    pub auth_issuer: String,

    #[serde(default = "audience_default")]
    pub auth_audience: String,
}

impl AppConfig {
    /// Builds a config with the given core settings and defaults for the rest.
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        refresh_token_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            refresh_token_expiration,
            host,
            port,
            environment,
            log_level: level_default(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: pool_max_default(),
            db_min_connections: pool_min_default(),
            db_connect_timeout_secs: connect_timeout_default(),
            db_idle_timeout_secs: idle_timeout_default(),
            db_acquire_timeout_secs: acquire_timeout_default(),
            event_channel_capacity: event_capacity_default(),
            auth_issuer: issuer_default(),
            auth_audience: audience_default(),
        }
    }

    fn runs_in(&self, environment: &str) -> bool {
        self.environment.eq_ignore_ascii_case(environment)
    }

    pub fn is_production(&self) -> bool {
        self.runs_in("production")
    }

    pub fn is_development(&self) -> bool {
        self.runs_in("development")
    }

    /// True when at least one non-blank CORS origin is configured.
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .is_some_and(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
    }

    /// Whether the permissive CORS fallback may be used.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Cross-field checks that the derive-based validation cannot express.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut reject = |field: &'static str, code: &'static str, message: &'static str| {
            let mut failure = ValidationError::new(code);
            failure.message = Some(message.into());
            errors.add(field, failure);
        };

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            reject(
                "cors_allowed_origins",
                "cors_allowed_origins_required",
                "No CORS origins configured: set APP__CORS_ALLOWED_ORIGINS, or set APP__CORS_ALLOW_ANY_ORIGIN=true to accept any origin",
            );
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            reject(
                "jwt_secret",
                "jwt_secret_default_dev",
                "The built-in development JWT secret is only valid when environment=development; set APP__JWT_SECRET to a dedicated value",
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration rejected: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn port_default() -> u16 {
    DEFAULT_PORT
}
fn level_default() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn pool_max_default() -> u32 {
    16
}
fn pool_min_default() -> u32 {
    2
}
fn connect_timeout_default() -> u64 {
    30
}
fn idle_timeout_default() -> u64 {
    600
}
fn acquire_timeout_default() -> u64 {
    8
}
fn event_capacity_default() -> usize {
    1024
}
fn issuer_default() -> String {
    "stockroom-api".to_string()
}
fn audience_default() -> String {
    "stockroom-clients".to_string()
}

/// Scans a trimmed secret and names the first weakness found.
/// Placeholder matches take precedence over the length rule.
fn jwt_secret_weakness(trimmed: &str) -> Option<&'static str> {
    if PLACEHOLDER_SECRETS
        .iter()
        .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        return Some("JWT secret matches a known placeholder and must be replaced");
    }

    if trimmed.len() < 64 {
        return Some("JWT secret must be at least 64 characters long");
    }

    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return Some("JWT secret cannot be a single repeated character");
        }
    }

    let lowered = trimmed.to_ascii_lowercase();
    if WEAK_SECRET_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
    {
        return Some("JWT secret contains a common weak pattern; generate a random value instead");
    }

    let distinct: std::collections::HashSet<char> = trimmed.chars().collect();
    if distinct.len() < 10 {
        return Some("JWT secret needs at least 10 distinct characters");
    }

    None
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    match jwt_secret_weakness(secret.trim()) {
        None => Ok(()),
        Some(reason) => {
            let mut failure = ValidationError::new("jwt_secret");
            failure.message = Some(reason.into());
            Err(failure)
        }
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity > 0 {
        return Ok(());
    }
    let mut failure = ValidationError::new("event_channel_capacity");
    failure.message = Some("event_channel_capacity cannot be zero".into());
    Err(failure)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    let directive = match env::var("RUST_LOG") {
        Ok(custom) if !custom.trim().is_empty() => custom,
        _ => format!("stockroom_api={level},tower_http=debug"),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(directive);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads configuration in layers: built-in defaults, then `config/default`
/// and `config/{environment}` files, then `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = ["RUN_ENV", "APP_ENV"]
        .into_iter()
        .find_map(|key| env::var(key).ok())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "No '{}' directory present; using built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://stockroom.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("jwt_expiration", 3600)?
        .set_default("refresh_token_expiration", 604_800)?;

    for profile in ["default", run_env.as_str()] {
        builder = builder.add_source(File::with_name(&format!("{CONFIG_DIR}/{profile}")).required(false));
    }

    let merged = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // jwt_secret deliberately has no default; fail early with a usable hint.
    if merged.get_string("jwt_secret").is_err() {
        error!("No JWT secret configured; refusing to start without one");
        error!("Provide APP__JWT_SECRET (generate one with: openssl rand -base64 64)");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret missing: set the APP__JWT_SECRET environment variable".into(),
        )));
    }

    let app_config: AppConfig = merged.try_deserialize()?;

    app_config
        .validate()
        .and_then(|_| app_config.validate_additional_constraints())
        .map_err(|failures| {
            error!("Configuration rejected: {:?}", failures);
            AppConfigError::Validation(failures)
        })?;

    info!(environment = %app_config.environment, "Configuration loaded");
    Ok(app_config)
}
