use anyhow::{Context, Result};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::server::models::{NewTask, Pagination, Task};

/// Optional filters for the task listing. `agent_addr` matches the
/// recorded solver, `owner_addr` the task creator.
#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub unsolved: bool,
    pub agent_addr: Option<String>,
    pub owner_addr: Option<String>,
}

/// Owns every task state transition. All durable state lives in
/// Postgres; one-shot transitions are expressed as single conditional
/// updates so concurrent callers cannot both win.
pub struct TaskLedgerService {
    pool: PgPool,
}

impl TaskLedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_task(&self, new_task: &NewTask) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks ("user", prompt, task_type, solver, coupon, fee, fee_unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new_task.user)
        .bind(&new_task.prompt)
        .bind(&new_task.task_type)
        .bind(&new_task.solver)
        .bind(&new_task.coupon)
        .bind(new_task.fee)
        .bind(&new_task.fee_unit)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create task")?;

        Ok(task)
    }

    pub async fn get_by_unique_id(&self, unique_id: Uuid) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE unique_id = $1")
            .bind(unique_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch task")?;

        Ok(task)
    }

    /// Keyset-paginated listing ordered strictly by `id`. The cursor row
    /// itself is excluded (strict inequality), so no row is delivered
    /// twice across pages.
    pub async fn list(&self, filter: &TaskFilter, page: Pagination) -> Result<Vec<Task>> {
        let mut query = QueryBuilder::new("SELECT * FROM tasks WHERE 1=1");

        if let Some(agent_addr) = &filter.agent_addr {
            query.push(" AND solver = ").push_bind(agent_addr);
        }
        if let Some(owner_addr) = &filter.owner_addr {
            query.push(" AND \"user\" = ").push_bind(owner_addr);
        }
        if filter.unsolved {
            query.push(" AND (solution IS NULL OR solution = '')");
        }
        if let Some(cursor) = page.cursor {
            query
                .push(if page.ascend { " AND id > " } else { " AND id < " })
                .push_bind(cursor);
        }
        query
            .push(if page.ascend {
                " ORDER BY id ASC LIMIT "
            } else {
                " ORDER BY id DESC LIMIT "
            })
            .push_bind(page.limit);

        let tasks = query
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tasks")?;

        Ok(tasks)
    }

    /// Record a solution iff the task is still unsolved. The predicate
    /// repeats the unsolved check so two concurrent submissions cannot
    /// both succeed; `None` means the claim was lost.
    pub async fn claim_solution(
        &self,
        unique_id: Uuid,
        solution: &str,
        solver: &str,
        solver_type: Option<Vec<String>>,
        optimized_prompt: Option<&str>,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET solution = $2,
                solver = $3,
                solver_type = COALESCE($4, solver_type),
                optimized_prompt = $5,
                solved_at = NOW()
            WHERE unique_id = $1
              AND (solution IS NULL OR solution = '')
            RETURNING *
            "#,
        )
        .bind(unique_id)
        .bind(solution)
        .bind(solver)
        .bind(solver_type)
        .bind(optimized_prompt)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update task")?;

        Ok(task)
    }

    /// Record a review iff none exists yet. `None` means the review slot
    /// was already taken.
    pub async fn set_review(&self, unique_id: Uuid, review: &str) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET review = $2,
                reviewed_at = NOW()
            WHERE unique_id = $1
              AND review IS NULL
            RETURNING *
            "#,
        )
        .bind(unique_id)
        .bind(review)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update review")?;

        Ok(task)
    }
}
