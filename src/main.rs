use anyhow::Result;
use frame_translator::config::Config;
use frame_translator::server;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frame_translator=info".parse()?),
        )
        .init();

    info!("Starting translation proxy");

    let config = Config::from_env()?;
    if config.deepl_api_key.is_none() {
        warn!("DEEPL_API_KEY not set; requests must carry their own apiKey");
    }

    server::serve(config).await
}
