use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::{config::AppState, errors::ApiError, services::solver_auth};

#[derive(Debug, Serialize)]
pub struct AgentKeyResponse {
    pub privkey: String,
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct SignTaskRequest {
    pub unique_id: Option<String>,
    pub privkey: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignTaskResponse {
    pub message: String,
    pub signature: String,
    pub signer: String,
}

/// Mint a throwaway keypair for client integration.
pub async fn gen_agent_key() -> Json<AgentKeyResponse> {
    let (privkey, addr) = solver_auth::generate_keypair();
    Json(AgentKeyResponse { privkey, addr })
}

/// Produce the canonical message for a task and a signature over it,
/// so solver clients can exercise the submit path end to end. Uses the
/// same digest as the `submit_solution` verifier.
pub async fn sign_task(
    State(state): State<AppState>,
    Json(request): Json<SignTaskRequest>,
) -> Result<Json<SignTaskResponse>, ApiError> {
    let (Some(unique_id), Some(privkey)) = (request.unique_id, request.privkey) else {
        return Err(ApiError::validation(
            "Missing required fields: unique_id and privkey are required",
        ));
    };

    let unique_id = Uuid::parse_str(&unique_id)
        .map_err(|_| ApiError::validation("unique_id must be a valid UUID"))?;

    let task = state
        .ledger
        .get_by_unique_id(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let message = solver_auth::canonical_message(&task.prompt, &task.unique_id.to_string());
    let signature = solver_auth::sign_message(&message, &privkey)
        .map_err(|err| ApiError::validation(err.to_string()))?;
    let signer = solver_auth::derive_address(&privkey)
        .map_err(|err| ApiError::validation(err.to_string()))?;

    Ok(Json(SignTaskResponse {
        message,
        signature,
        signer,
    }))
}
