//! # Hook Gateway Service
//!
//! Binary entry point for the webhook gateway.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Wires the GitHub parser, tenant client and workspace forwarder
//! - Starts the HTTP server from hook-gateway-api

mod settings;

use anyhow::Context;
use clap::Parser;
use hook_gateway_api::{start_server, LoggingConfig, ServiceConfig};
use hook_gateway_core::{
    GithubWebhookParser, LiteralSecretProvider, TenantInstallationHandler, TenantServiceClient,
    WebhookGateway, WorkspaceForwarder,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration errors exit with this code
const CONFIG_EXIT_CODE: i32 = 3;

#[derive(Debug, Parser)]
#[command(name = "hook-gateway", version, about = "GitHub App webhook gateway")]
struct Args {
    /// Additional YAML configuration file
    #[arg(long, env = "HOOK_GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let service_config = match settings::load_config(args.config.as_deref(), None) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    init_tracing(&service_config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Hook Gateway");

    let gateway = match build_gateway(&service_config) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!(error = ?e, "Failed to build webhook gateway; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        tenant = %service_config.tenant.base_url,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, gateway).await {
        error!("Server terminated: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize tracing; `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},hook_gateway_core={level},hook_gateway_api={level},tower_http=debug",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

// ============================================================================
// Private helpers
// ============================================================================

/// Wire the gateway from configuration.
fn build_gateway(config: &ServiceConfig) -> anyhow::Result<WebhookGateway> {
    if config.webhooks.secret.is_empty() {
        warn!(
            "No webhook secret configured; signature verification will be SKIPPED. \
             Do not use in production."
        );
    }

    let tenant = Arc::new(
        TenantServiceClient::new(&config.tenant.base_url, config.tenant.timeout())
            .context("failed to create tenant service client")?,
    );

    let http = reqwest::Client::builder()
        .timeout(config.tenant.timeout())
        .build()
        .context("failed to create forwarding HTTP client")?;

    let gateway = WebhookGateway::new(
        Arc::new(GithubWebhookParser::new()),
        Arc::new(LiteralSecretProvider::new(config.webhooks.secret.clone())),
        Arc::new(TenantInstallationHandler::new(tenant.clone())),
        Arc::new(WorkspaceForwarder::new(tenant, http)),
    )
    .with_retry_policy(config.retry.to_policy());

    Ok(gateway)
}
