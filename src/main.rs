use std::{error::Error, sync::Arc};

use component_index::{RciConfig, RciService};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present.
    dotenvy::dotenv().ok();

    init_tracing();

    let config = RciConfig::from_env()?;
    tracing::info!(
        store = %config.store.path,
        model = %config.embeddings.model,
        dimension = config.dimension,
        "starting component index service"
    );

    let service = Arc::new(RciService::new(config).await?);

    api::start(service).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
