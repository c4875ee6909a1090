//! Shopify Upload Relay - storefront file uploads into Shopify Files

use clap::Parser;
use shopify_upload_relay::config::Config;
use shopify_upload_relay::metrics::server::MetricsServer;
use shopify_upload_relay::{server::Server, telemetry, VERSION};
use std::path::PathBuf;
use tracing::{info, warn};

/// Relay storefront uploads into Shopify Files
#[derive(Parser, Debug)]
#[command(name = "shopify-upload-relay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file (environment variables otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter directive, overrides the configured level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing .env file is fine
    let dotenv = dotenvy::dotenv().ok();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    telemetry::init_subscriber(&config.logging)?;

    info!("Starting Shopify Upload Relay v{}", VERSION);
    match (&args.config, dotenv) {
        (Some(path), _) => info!("Loaded configuration from {:?}", path),
        (None, Some(path)) => info!("Loaded environment from {:?}", path),
        (None, None) => info!("Loaded configuration from environment"),
    }
    info!(
        shop = %config.shop.domain,
        api_version = %config.shop.api_version,
        environment = config.environment.as_str(),
        max_file_size = config.upload.max_file_size,
        "Relay configured"
    );
    if config.environment.is_development() {
        warn!("Development mode: upstream error details are returned to clients");
    }

    let mut metrics_server = if config.metrics.enabled {
        let mut server = MetricsServer::from_config(&config.metrics);
        server.start().await?;
        Some(server)
    } else {
        None
    };

    let server = Server::new(config).await?;
    let result = server.run().await;

    if let Some(metrics) = metrics_server.as_mut() {
        metrics.shutdown().await;
    }

    result?;
    Ok(())
}
