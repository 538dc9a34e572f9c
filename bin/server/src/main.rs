use pdp_check_server::{config::ServerConfig, error::ServerError};
use rootcause::prelude::Report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(report) = start().await {
        tracing::error!("{report}");
        std::process::exit(1);
    }
}

async fn start() -> Result<(), Report<ServerError>> {
    // Load configuration from environment
    let config = ServerConfig::from_env().map_err(|e| ServerError::Config {
        details: e.to_string(),
    })?;
    tracing::info!(pdp = config.pdp.url(), "Loaded configuration");

    pdp_check_server::run(config).await
}
