use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agent_market::agent::{agent_router, AgentConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agent_market=debug")),
        )
        .init();

    let config = AgentConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let app = agent_router(config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("llm-agent listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
