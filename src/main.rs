use anyhow::{anyhow, Result};
use sap::config::ClientConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sap=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    config.validate()?;

    info!(
        "Starting SAP chat client (backend: {}, session: {})",
        config.backend_url, config.session_id
    );

    sap::ui::run(config).map_err(|e| anyhow!("GUI error: {}", e))
}
