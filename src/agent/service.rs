use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::server::{errors::ApiError, services::solver_auth, services::LlmService};

use super::{config::AgentConfig, market::MarketClient, market::SubmitSolutionBody};

#[derive(Clone)]
pub struct AgentState {
    pub config: Arc<AgentConfig>,
    pub market: Arc<MarketClient>,
    pub llm: Arc<LlmService>,
}

#[derive(Debug, Deserialize)]
pub struct SolveTaskParams {
    pub task_id: Option<String>,
}

pub fn agent_router(config: AgentConfig) -> Router {
    let state = AgentState {
        market: Arc::new(MarketClient::new(&config.market_url)),
        llm: Arc::new(LlmService::new(
            &config.llm_api_url,
            &config.llm_api_key,
            &config.llm_model,
        )),
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(root))
        .route("/solve_task", get(solve_task))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello from llm-agent!"
}

/// Fetch the task, produce a solution through the completion API, sign
/// the canonical message when this agent is the designated solver, and
/// submit.
pub async fn solve_task(
    State(state): State<AgentState>,
    Query(params): Query<SolveTaskParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(task_id) = params.task_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::validation("task_id parameter is required"));
    };

    let task = state
        .market
        .get_task(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if task.is_solved() {
        return Err(ApiError::validation("This task has already been solved"));
    }

    // If the task designates a solver it must be this agent, and the
    // submission has to carry a signature over the canonical message.
    let signature = match task.designated_solver() {
        Some(designated) => {
            if !solver_auth::addresses_match(designated, &state.config.agent_addr) {
                return Err(ApiError::forbidden(
                    "Task is designated to a different solver",
                    json!({ "designatedSolver": designated }),
                ));
            }
            let Some(privkey) = state.config.agent_privkey.as_deref() else {
                return Err(ApiError::validation(
                    "AGENT_PRIVKEY is required to solve designated tasks",
                ));
            };
            let message =
                solver_auth::canonical_message(&task.prompt, &task.unique_id.to_string());
            let signature = solver_auth::sign_message(&message, privkey)
                .map_err(|err| ApiError::validation(err.to_string()))?;
            Some(signature)
        }
        None => None,
    };

    let solution = state
        .llm
        .chat_completion(&state.config.system_prompt, &task.prompt)
        .await?;

    let submitted = state
        .market
        .submit_solution(&SubmitSolutionBody {
            unique_id: task.unique_id.to_string(),
            solution,
            solver: state.config.agent_addr.clone(),
            solver_type: Some(vec![state.config.llm_model.clone()]),
            optimized_prompt: None,
            signature,
        })
        .await?;

    info!("solved task {}", submitted.unique_id);
    Ok(Json(json!({
        "message": "LLM response generated and solution submitted successfully",
        "task": submitted,
    })))
}
