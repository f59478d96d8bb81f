use std::{
    env,
    net::{AddrParseError, SocketAddr},
};

use thiserror::Error;

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI assistant solving tasks from the agent market. \
     Provide a direct, complete answer to the task prompt.";

/// Solver agent identity and endpoints, loaded once at startup. The
/// private key is only required when the agent expects to be designated
/// as a task's solver.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub bind_addr: SocketAddr,
    pub market_url: String,
    pub agent_addr: String,
    pub agent_privkey: Option<String>,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub system_prompt: String,
}

#[derive(Debug, Error)]
pub enum AgentConfigError {
    #[error("invalid AGENT_BIND_ADDR: {0}")]
    BindAddrParse(#[from] AddrParseError),
    #[error("AGENT_ADDR is required")]
    MissingAgentAddr,
    #[error("LLM_API_KEY is required")]
    MissingApiKey,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, AgentConfigError> {
        let bind_addr = env::var("AGENT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8100".to_string())
            .parse()?;
        let market_url =
            env::var("MARKET_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let agent_addr = env::var("AGENT_ADDR").map_err(|_| AgentConfigError::MissingAgentAddr)?;
        let agent_privkey = env::var("AGENT_PRIVKEY").ok();
        let llm_api_url =
            env::var("LLM_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
        let llm_api_key = env::var("LLM_API_KEY").map_err(|_| AgentConfigError::MissingApiKey)?;
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let system_prompt =
            env::var("AGENT_SYSTEM_PROMPT").unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string());

        Ok(Self {
            bind_addr,
            market_url,
            agent_addr,
            agent_privkey,
            llm_api_url,
            llm_api_key,
            llm_model,
            system_prompt,
        })
    }
}
