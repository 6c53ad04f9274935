//! # Foxy-Bot CLI
//!
//! Command-line interface for Foxy-Bot.
//!
//! This module provides CLI commands for:
//! - Rendering a saved webhook payload exactly as the service would
//! - Validating and showing the service configuration
//! - Sending a rendered payload to a chat, e.g. to test a bot token

use clap::{Parser, Subcommand};
use foxy_bot_api::{
    ChatDelivery, ConfigError, DeliveryError, SendMessageRequest, ServiceConfig, TelegramClient,
    TelegramConfig,
};
use foxy_bot_core::{build_notification, Notification};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Foxy-Bot CLI - GitLab webhook notifications for Telegram
#[derive(Parser)]
#[command(name = "foxy-bot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relay GitLab webhook events to Telegram chats")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Render a webhook payload and print the resulting message
    ///
    /// Prints nothing when the event would not be announced.
    Render {
        /// Event type, as sent in the X-Gitlab-Event header
        #[arg(short, long)]
        event: String,

        /// Payload file; `-` or omitted reads standard input
        #[arg(short, long)]
        payload: Option<PathBuf>,
    },

    /// Validate configuration
    Config {
        /// Configuration file to validate instead of the standard locations
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format for the resolved configuration
        #[arg(short = 'o', long, default_value = "text")]
        format: OutputFormat,
    },

    /// Render a webhook payload and send it to a chat
    Send {
        /// Event type, as sent in the X-Gitlab-Event header
        #[arg(short, long)]
        event: String,

        /// Payload file; `-` or omitted reads standard input
        #[arg(short, long)]
        payload: Option<PathBuf>,

        /// Destination chat id
        #[arg(short, long, env = "USE_GITLAB_CHAT_ID")]
        chat_id: String,

        /// Telegram bot token
        #[arg(long, env = "FOXY_BOT_TOKEN", hide_env_values = true)]
        bot_token: String,

        /// Telegram Bot API base URL
        #[arg(long, default_value = "https://api.telegram.org")]
        api_base_url: String,
    },
}

/// Output format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Telegram rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: Value },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::InvalidPayload { .. } => 2,
            Self::Delivery(_) => 3,
            Self::Rejected { .. } => 4,
            Self::Io(_) => 5,
            Self::CommandFailed { .. } => 6,
        }
    }
}

// ============================================================================
// CLI Execution
// ============================================================================

/// Parse arguments and run the selected command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Render { event, payload } => {
            let payload = read_payload(payload.as_deref())?;
            execute_render_command(&event, &payload, &mut out)
        }
        Commands::Config { file, format } => {
            execute_config_command(file.as_deref(), format, &mut out)
        }
        Commands::Send {
            event,
            payload,
            chat_id,
            bot_token,
            api_base_url,
        } => {
            let payload = read_payload(payload.as_deref())?;
            let telegram = TelegramConfig {
                api_base_url,
                bot_token,
                ..TelegramConfig::default()
            };
            let client = TelegramClient::new(&telegram)?;
            execute_send_command(&client, &event, &payload, &chat_id, &mut out).await
        }
    }
}

/// Log to stderr so that command output on stdout stays machine-readable.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .map_err(|e| CliError::CommandFailed {
            message: format!("invalid log level '{}': {}", cli.log_level, e),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::CommandFailed {
        message: format!("failed to initialize logging: {}", e),
    })
}

/// Read a payload from `path`, or from standard input for `None` and `-`.
fn read_payload(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Render `payload` as the service would for the event type `event`.
///
/// Unlike the service, which acknowledges anything, the CLI rejects a
/// payload that is not JSON so that typos in saved fixtures are visible.
pub fn render_payload(event: &str, payload: &str) -> Result<Notification, CliError> {
    let payload: Value = serde_json::from_str(payload).map_err(|e| CliError::InvalidPayload {
        message: e.to_string(),
    })?;
    Ok(build_notification(event, &payload))
}

/// Print the rendered message, or nothing if the event is not announced.
pub fn execute_render_command(
    event: &str,
    payload: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match render_payload(event, payload)? {
        Notification::Text(text) => writeln!(out, "{text}")?,
        Notification::Empty => info!(event_type = %event, "Event would not be announced"),
    }
    Ok(())
}

/// Load, validate and print the configuration with secrets redacted.
pub fn execute_config_command(
    file: Option<&Path>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = match file {
        Some(file) => {
            let env: HashMap<String, String> = std::env::vars().collect();
            ServiceConfig::load_from(&[], Some(file), &env)?
        }
        None => ServiceConfig::load()?,
    };
    config.validate()?;

    let redacted = config.redacted();
    match format {
        OutputFormat::Text => writeln!(out, "{redacted:#?}")?,
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&redacted).map_err(|e| CliError::CommandFailed {
                    message: format!("failed to serialize configuration: {}", e),
                })?;
            writeln!(out, "{json}")?;
        }
    }
    writeln!(out, "Configuration is valid")?;
    Ok(())
}

/// Render `payload` and deliver it to `chat_id`.
///
/// Prints Telegram's JSON response. Nothing is sent for events that are not
/// announced.
pub async fn execute_send_command(
    delivery: &dyn ChatDelivery,
    event: &str,
    payload: &str,
    chat_id: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let text = match render_payload(event, payload)? {
        Notification::Text(text) => text,
        Notification::Empty => {
            info!(event_type = %event, "Event would not be announced; nothing sent");
            return Ok(());
        }
    };

    debug!(chat_id = %chat_id, "Sending notification");
    let response = delivery
        .send_message(&SendMessageRequest::markdown(chat_id, text))
        .await?;

    if !response.is_success() {
        return Err(CliError::Rejected {
            status: response.status,
            body: response.body,
        });
    }

    writeln!(out, "{}", response.body)?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
