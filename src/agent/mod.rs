pub mod config;
pub mod market;
pub mod service;

pub use config::AgentConfig;
pub use market::MarketClient;
pub use service::agent_router;
