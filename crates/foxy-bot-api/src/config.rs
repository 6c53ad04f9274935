//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// System-wide configuration file, loaded when present.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/foxy-bot/service.yaml";

/// Deployment-local configuration file, loaded when present.
pub const LOCAL_CONFIG_PATH: &str = "config/service.yaml";

/// Environment variable naming an additional, required configuration file.
pub const CONFIG_FILE_ENV: &str = "FOXY_CONFIG_FILE";

/// Prefix of structured environment overrides, e.g. `FOXY__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "FOXY";

/// Separator between the prefix and nested keys of environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Flat environment variables understood for compatibility with existing
/// deployments, and the configuration key each one sets.
pub const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("FOXY_BOT_TOKEN", "telegram.bot_token"),
    ("USE_GITLAB_TOKEN", "webhook.secret_token"),
    ("USE_GITLAB_CHAT_ID", "telegram.default_chat_id"),
];

const REDACTED: &str = "<REDACTED>";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Telegram Bot API settings
    pub telegram: TelegramConfig,

    /// Webhook endpoint settings
    pub webhook: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from the standard sources.
    ///
    /// Sources are applied in order, later ones overriding earlier ones:
    ///  1. [`SYSTEM_CONFIG_PATH`] (optional)
    ///  2. [`LOCAL_CONFIG_PATH`] (optional)
    ///  3. The file named by [`CONFIG_FILE_ENV`] (required when set)
    ///  4. `FOXY__SECTION__KEY` environment variables
    ///  5. The flat variables in [`LEGACY_ENV_VARS`]
    ///
    /// The result is not validated; call [`ServiceConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let explicit = env
            .get(CONFIG_FILE_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self::load_from(
            &[Path::new(SYSTEM_CONFIG_PATH), Path::new(LOCAL_CONFIG_PATH)],
            explicit.as_deref(),
            &env,
        )
    }

    /// Load configuration from explicit sources.
    ///
    /// `optional_files` are skipped when missing, `required_file` must exist.
    /// `env` stands in for the process environment. File formats are chosen
    /// by extension (`.yaml`, `.json` or `.toml`).
    pub fn load_from(
        optional_files: &[&Path],
        required_file: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        for path in optional_files {
            builder = builder.add_source(::config::File::from(*path).required(false));
        }

        if let Some(path) = required_file {
            if !path.exists() {
                return Err(ConfigError::Missing {
                    key: path.display().to_string(),
                });
            }
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .source(Some(env.clone().into_iter().collect())),
        );

        for (variable, key) in LEGACY_ENV_VARS {
            let value = env.get(*variable).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Check the configuration for values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "telegram.bot_token".to_string(),
            });
        }

        if let Err(e) = url::Url::parse(&self.telegram.api_base_url) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "telegram.api_base_url '{}' is not a valid URL: {}",
                    self.telegram.api_base_url, e
                ),
            });
        }

        if !self.webhook.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path '{}' must start with '/'",
                    self.webhook.endpoint_path
                ),
            });
        }

        if self.webhook.endpoint_path == HEALTH_PATH {
            return Err(ConfigError::Invalid {
                message: format!("webhook.endpoint_path must not be '{HEALTH_PATH}'"),
            });
        }

        if self.webhook.chat_id_query_param.is_empty() {
            return Err(ConfigError::Invalid {
                message: "webhook.chat_id_query_param must not be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be greater than zero".to_string(),
            });
        }

        if self
            .webhook
            .secret_token
            .as_deref()
            .is_some_and(|token| token.is_empty())
        {
            return Err(ConfigError::Invalid {
                message: "webhook.secret_token must not be empty when set".to_string(),
            });
        }

        Ok(())
    }

    /// Copy of the configuration with every secret replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.telegram.bot_token.is_empty() {
            config.telegram.bot_token = REDACTED.to_string();
        }
        if config.webhook.secret_token.is_some() {
            config.webhook.secret_token = Some(REDACTED.to_string());
        }
        config
    }
}

/// Path of the liveness endpoint.
pub(crate) const HEALTH_PATH: &str = "/health";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    ///
    /// GitLab retries webhooks that are not answered within 10 seconds.
    pub timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 9,
            shutdown_timeout_seconds: 30,
            max_body_size: 5 * 1024 * 1024, // 5MB
            enable_cors: false,
        }
    }
}

/// Telegram Bot API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_base_url: String,

    /// Bot token issued by BotFather
    pub bot_token: String,

    /// Chat used when a request names none
    pub default_chat_id: Option<String>,

    /// Timeout for a single Bot API call in seconds
    pub timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            default_chat_id: None,
            timeout_seconds: 8,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &REDACTED)
            .field("default_chat_id", &self.default_chat_id)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Webhook endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Expected `X-Gitlab-Token` value; no check when unset
    pub secret_token: Option<String>,

    /// Query parameter that overrides the destination chat
    pub chat_id_query_param: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/api".to_string(),
            secret_token: None,
            chat_id_query_param: "chat_id".to_string(),
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint_path", &self.endpoint_path)
            .field("secret_token", &self.secret_token.as_ref().map(|_| REDACTED))
            .field("chat_id_query_param", &self.chat_id_query_param)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
