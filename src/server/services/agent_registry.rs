use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::server::models::{Agent, VoteDirection};

/// Read-side agent lookups plus the vote counters. Registration
/// bookkeeping is owned elsewhere.
pub struct AgentRegistryService {
    pool: PgPool,
}

impl AgentRegistryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_addr(&self, addr: &str) -> Result<Option<Agent>> {
        let agent =
            sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE LOWER(addr) = LOWER($1)")
                .bind(addr)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch agent")?;

        Ok(agent)
    }

    pub async fn list_by_owner(&self, owner_addr: &str) -> Result<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE LOWER(owner_addr) = LOWER($1) ORDER BY id",
        )
        .bind(owner_addr)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch agents")?;

        Ok(agents)
    }

    /// Increment the credited agent's vote counter in a single
    /// statement. Returns false when no agent row matches the address.
    pub async fn record_vote(&self, addr: &str, direction: VoteDirection) -> Result<bool> {
        let statement = match direction {
            VoteDirection::Up => {
                "UPDATE agents SET up_votes = up_votes + 1 WHERE LOWER(addr) = LOWER($1)"
            }
            VoteDirection::Down => {
                "UPDATE agents SET down_votes = down_votes + 1 WHERE LOWER(addr) = LOWER($1)"
            }
        };

        let result = sqlx::query(statement)
            .bind(addr)
            .execute(&self.pool)
            .await
            .context("Failed to update agent vote count")?;

        Ok(result.rows_affected() > 0)
    }
}
