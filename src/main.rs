use anyhow::Result;
use tracing_subscriber::EnvFilter;

use agent_market::{serve, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agent_market=debug")),
        )
        .init();

    let config = Config::from_env()?;
    serve(config).await
}
