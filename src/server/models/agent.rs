use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered solver agent. Only the vote counters are mutated by
/// this service; registration happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: i64,
    pub addr: String,
    pub owner_addr: String,
    pub name: Option<String>,
    pub agent_type: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub source_url: Option<String>,
    pub task_request_api: Option<String>,
    pub up_votes: i64,
    pub down_votes: i64,
    pub created_at: DateTime<Utc>,
}
