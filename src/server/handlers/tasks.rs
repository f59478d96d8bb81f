use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::server::{
    config::AppState,
    errors::ApiError,
    models::{ListTasksParams, NewTask, Pagination, Task, TaskPage, VoteDirection},
    services::{solver_auth, TaskFilter},
};

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub user: Option<String>,
    pub prompt: Option<String>,
    pub task_type: Option<String>,
    pub solver: Option<String>,
    pub coupon: Option<String>,
    pub fee: Option<f64>,
    pub fee_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetTaskParams {
    pub unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSolutionRequest {
    pub unique_id: Option<String>,
    pub solution: Option<String>,
    pub solver: Option<String>,
    pub solver_type: Option<Vec<String>>,
    pub optimized_prompt: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewSolutionRequest {
    pub unique_id: Option<String>,
    pub review: Option<String>,
    pub privkey: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteAgentRequest {
    pub privkey: Option<String>,
    pub unique_id: Option<String>,
    pub vote: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub vote: String,
    pub solver: String,
    pub message: String,
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(request): Json<AddTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let (Some(user), Some(prompt), Some(task_type)) = (
        non_empty(request.user),
        non_empty(request.prompt),
        non_empty(request.task_type),
    ) else {
        return Err(ApiError::validation(
            "Missing required fields: user, prompt, and task_type are required",
        ));
    };

    let task = state
        .ledger
        .create_task(&NewTask {
            user,
            prompt,
            task_type,
            solver: request.solver,
            coupon: request.coupon,
            fee: request.fee,
            fee_unit: request.fee_unit,
        })
        .await?;

    info!("created task {}", task.unique_id);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<TaskPage>, ApiError> {
    let page = Pagination::from_params(&params)
        .map_err(|err| ApiError::validation(err.to_string()))?;

    let filter = TaskFilter {
        unsolved: params.unsolved.as_deref() == Some("true"),
        agent_addr: params.agent_addr,
        owner_addr: params.owner_addr,
    };

    let tasks = state.ledger.list(&filter, page).await?;
    Ok(Json(TaskPage::new(tasks, page)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Query(params): Query<GetTaskParams>,
) -> Result<Json<Task>, ApiError> {
    let unique_id = parse_unique_id(params.unique_id)?;

    let task = state
        .ledger
        .get_by_unique_id(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(Json(task))
}

pub async fn submit_solution(
    State(state): State<AppState>,
    Json(request): Json<SubmitSolutionRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let (Some(unique_id), Some(solution), Some(solver)) = (
        request.unique_id.clone(),
        non_empty(request.solution),
        non_empty(request.solver),
    ) else {
        return Err(ApiError::validation(
            "Missing required fields: unique_id, solution, and solver are required",
        ));
    };
    let unique_id = parse_unique_id(Some(unique_id))?;

    let task = state
        .ledger
        .get_by_unique_id(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if task.is_solved() {
        return Err(already_solved(&task));
    }

    // The recorded solver is either the pre-assigned one or, failing
    // that, the caller-asserted one. A pre-assignment also demands a
    // valid signature over the canonical message.
    let recorded_solver = match task.designated_solver() {
        Some(designated) => {
            let message = solver_auth::canonical_message(&task.prompt, &unique_id.to_string());

            let Some(signature) = request.signature.as_deref() else {
                return Err(ApiError::validation_with(
                    "Signature is required when task has a designated solver",
                    json!({
                        "expectedMessage": message,
                        "hint": "Sign the message (SHA256 hash of prompt + unique_id) with your private key",
                    }),
                ));
            };

            let recovered = solver_auth::recover_signer(&message, signature)
                .map_err(|err| ApiError::validation(err.to_string()))?;

            if !solver_auth::addresses_match(&recovered, designated) {
                return Err(ApiError::forbidden(
                    "Signature verification failed: You are not the designated solver",
                    json!({
                        "designatedSolver": designated,
                        "yourAddress": recovered,
                    }),
                ));
            }

            if !solver_auth::addresses_match(&solver, designated) {
                return Err(ApiError::forbidden(
                    "solver does not match the designated solver",
                    json!({ "designatedSolver": designated }),
                ));
            }

            designated.to_string()
        }
        None => solver,
    };

    let updated = state
        .ledger
        .claim_solution(
            unique_id,
            &solution,
            &recorded_solver,
            request.solver_type.clone(),
            request.optimized_prompt.as_deref(),
        )
        .await?;

    let Some(updated) = updated else {
        // Lost the claim race; re-read for the conflict diagnostics.
        let current = state
            .ledger
            .get_by_unique_id(unique_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        return Err(already_solved(&current));
    };

    info!("task {} solved by {}", unique_id, recorded_solver);

    // Best-effort: the solution write is already durable and
    // authoritative, so a coupon failure is logged, not propagated.
    if let Some(coupon) = updated.coupon_addr() {
        if let Err(err) = state.coupons.mark_used(coupon, &recorded_solver).await {
            error!("failed to mark coupon {} used: {:?}", coupon, err);
        }
    }

    Ok(Json(TaskResponse {
        success: true,
        task: updated,
    }))
}

pub async fn review_solution(
    State(state): State<AppState>,
    Json(request): Json<ReviewSolutionRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let (Some(unique_id), Some(review), Some(privkey)) = (
        request.unique_id,
        non_empty(request.review),
        non_empty(request.privkey),
    ) else {
        return Err(ApiError::validation(
            "Missing required fields: unique_id, review, and privkey are required",
        ));
    };
    let unique_id = parse_unique_id(Some(unique_id))?;

    let task = state
        .ledger
        .get_by_unique_id(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if let Some(existing) = &task.review {
        return Err(already_reviewed(existing, &task));
    }

    let Some(coupon_addr) = task.coupon_addr() else {
        return Err(ApiError::validation(
            "Task does not have a coupon associated",
        ));
    };

    verify_coupon_holder(&privkey, coupon_addr)?;

    let updated = state.ledger.set_review(unique_id, &review).await?;
    let Some(updated) = updated else {
        let current = state
            .ledger
            .get_by_unique_id(unique_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        let existing = current.review.clone().unwrap_or_default();
        return Err(already_reviewed(&existing, &current));
    };

    if let Err(err) = state.coupons.mark_reviewed(coupon_addr).await {
        error!("failed to mark coupon {} reviewed: {:?}", coupon_addr, err);
    }

    Ok(Json(TaskResponse {
        success: true,
        task: updated,
    }))
}

pub async fn vote_agent(
    State(state): State<AppState>,
    Json(request): Json<VoteAgentRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let (Some(privkey), Some(unique_id), Some(vote)) = (
        non_empty(request.privkey),
        request.unique_id,
        non_empty(request.vote),
    ) else {
        return Err(ApiError::validation(
            "Missing required fields: privkey, unique_id, and vote are required",
        ));
    };
    let unique_id = parse_unique_id(Some(unique_id))?;

    let Some(direction) = VoteDirection::parse(&vote) else {
        return Err(ApiError::validation(
            "Invalid vote value: vote must be either 'up' or 'down'",
        ));
    };

    let task = state
        .ledger
        .get_by_unique_id(unique_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let Some(coupon_addr) = task.coupon_addr() else {
        return Err(ApiError::validation(
            "Task does not have a coupon associated",
        ));
    };
    let Some(solver) = task.designated_solver() else {
        return Err(ApiError::validation(
            "Task does not have a solver yet, cannot vote",
        ));
    };

    verify_coupon_holder(&privkey, coupon_addr)?;

    let coupon = state
        .coupons
        .get_by_addr(coupon_addr)
        .await?
        .ok_or_else(|| ApiError::not_found("Coupon not found in database"))?;

    if coupon.if_voted {
        return Err(already_voted(coupon.vote.as_deref()));
    }

    // CAS on `if_voted = FALSE`: of two concurrent votes, exactly one
    // claims the flag.
    let claimed = state.coupons.claim_vote(coupon_addr, direction).await?;
    if claimed.is_none() {
        let current = state.coupons.get_by_addr(coupon_addr).await?;
        return Err(already_voted(
            current.as_ref().and_then(|c| c.vote.as_deref()),
        ));
    }

    // Best-effort counter update; the vote is recorded on the coupon.
    match state.agents.record_vote(solver, direction).await {
        Ok(true) => {}
        Ok(false) => info!("no agent registered for solver {}", solver),
        Err(err) => error!("failed to update agent vote count: {:?}", err),
    }

    Ok(Json(VoteResponse {
        success: true,
        vote: vote.clone(),
        solver: solver.to_string(),
        message: format!("Successfully voted {} for agent", vote),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_unique_id(value: Option<String>) -> Result<Uuid, ApiError> {
    let raw = value.ok_or_else(|| ApiError::validation("unique_id is required"))?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::validation("unique_id must be a valid UUID"))
}

fn verify_coupon_holder(privkey: &str, coupon_addr: &str) -> Result<(), ApiError> {
    let derived = solver_auth::derive_address(privkey)
        .map_err(|_| ApiError::validation("Invalid private key format"))?;

    if !solver_auth::addresses_match(&derived, coupon_addr) {
        return Err(ApiError::forbidden(
            "Coupon verification failed: Private key does not match the task's coupon",
            json!({
                "expectedCoupon": coupon_addr,
                "providedAddress": derived,
            }),
        ));
    }
    Ok(())
}

fn already_solved(task: &Task) -> ApiError {
    ApiError::conflict(
        "Task already has a solution",
        json!({
            "existingSolution": {
                "solver": task.solver,
                "solvedAt": task.solved_at,
            }
        }),
    )
}

fn already_reviewed(existing: &str, task: &Task) -> ApiError {
    ApiError::conflict(
        "Task is already reviewed",
        json!({
            "existingReview": existing,
            "reviewedAt": task.reviewed_at,
        }),
    )
}

fn already_voted(previous: Option<&str>) -> ApiError {
    ApiError::conflict(
        "This coupon has already been used to vote",
        json!({ "previousVote": previous }),
    )
}
