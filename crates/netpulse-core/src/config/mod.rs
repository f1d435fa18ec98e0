//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `NETPULSE__*` environment variables. Each sub-module
//! represents a logical configuration section, and every field has a default
//! so an empty configuration is usable against a local backend.

pub mod auth;
pub mod channel;
pub mod control;
pub mod history;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::channel::ChannelConfig;
pub use self::control::ControlConfig;
pub use self::history::HistoryConfig;
pub use self::logging::{LogFormat, LoggingConfig};

use crate::error::AppError;

/// Root client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Push channel settings.
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Collection control API settings.
    #[serde(default)]
    pub control: ControlConfig,
    /// Metric and event history bounds.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Bearer credential.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// (`config/{env}.toml`) and environment variables prefixed with
    /// `NETPULSE` (e.g. `NETPULSE__CHANNEL__URL`). Missing files are skipped.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("NETPULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        tracing::debug!(env, channel = %loaded.channel.url, "Configuration loaded");
        Ok(loaded)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let loaded: Self = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the client cannot operate with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.history.max_data_points == 0 {
            return Err(AppError::configuration(
                "history.max_data_points must be greater than zero",
            ));
        }
        if self.history.max_events == 0 {
            return Err(AppError::configuration(
                "history.max_events must be greater than zero",
            ));
        }
        if self.channel.connect_timeout_ms == 0 {
            return Err(AppError::configuration(
                "channel.connect_timeout_ms must be greater than zero",
            ));
        }
        validate_url("channel.url", &self.channel.url, &["ws", "wss"])?;
        validate_url("control.api_url", &self.control.api_url, &["http", "https"])?;
        Ok(())
    }
}

fn validate_url(field: &str, raw: &str, schemes: &[&str]) -> Result<(), AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::configuration(format!("{field} must not be empty")));
    }
    let url = reqwest::Url::parse(raw)
        .map_err(|e| AppError::configuration(format!("{field} is not a valid URL: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(AppError::configuration(format!(
            "{field} must use one of {:?}, got '{}'",
            schemes,
            url.scheme()
        )));
    }
    Ok(())
}
