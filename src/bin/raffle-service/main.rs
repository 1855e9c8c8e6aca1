//! raffle-service CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use raffle_service::ServiceBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments and build configuration
    let config = Cli::parse().into_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (plain, json) = if config.log.json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(filter)
        .init();

    info!("raffle-service v{}", env!("CARGO_PKG_VERSION"));

    // Build and run the service
    let mut service = ServiceBuilder::new(config).build().await?;

    // Run until shutdown
    service.run().await?;

    info!("Goodbye!");
    Ok(())
}
