use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::server::{config::AppState, errors::ApiError};

#[derive(Debug, Deserialize)]
pub struct GetAgentParams {
    pub addr: Option<String>,
    pub owner_addr: Option<String>,
}

/// Lookup by `addr` returns a single agent; lookup by `owner_addr`
/// returns every agent that owner registered.
pub async fn get_agent(
    State(state): State<AppState>,
    Query(params): Query<GetAgentParams>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(addr) = params.addr.as_deref().filter(|a| !a.is_empty()) {
        let agent = state
            .agents
            .get_by_addr(addr)
            .await?
            .ok_or_else(|| ApiError::not_found("No agents found"))?;
        return Ok(Json(agent).into_response());
    }

    if let Some(owner_addr) = params.owner_addr.as_deref().filter(|a| !a.is_empty()) {
        let agents = state.agents.list_by_owner(owner_addr).await?;
        if agents.is_empty() {
            return Err(ApiError::not_found("No agents found"));
        }
        return Ok(Json(agents).into_response());
    }

    Err(ApiError::validation(
        "Either addr or owner_addr parameter is required",
    ))
}
