//! # Foxy-Bot Service
//!
//! Binary entry point for the Foxy-Bot HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Starts the HTTP server from foxy-bot-api
//!
//! Exit codes: `1` bind failure, `2` server failure, `3` configuration
//! error, `4` delivery client error.

use foxy_bot_api::{start_server, LoggingConfig, ServiceConfig};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration is loaded before logging so that `logging.*` applies;
    // failures at this stage go to stderr.
    let service_config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("foxy-bot-service: failed to load configuration: {e}");
            std::process::exit(3);
        }
    };

    init_logging(&service_config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Foxy-Bot Service");

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhook.endpoint_path,
        default_chat = service_config.telegram.default_chat_id.is_some(),
        token_check = service_config.webhook.secret_token.is_some(),
        "Configuration loaded"
    );

    if let Err(e) = start_server(service_config).await {
        error!(error = %e, "Server terminated with an error");
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "foxy_bot_service={level},foxy_bot_api={level},foxy_bot_core={level},tower_http=info",
            level = config.level
        ))
    })?;

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(())
}
