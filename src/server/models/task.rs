use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A unit of work on the market. `id` exists only to order keyset
/// pagination; `unique_id` is the identity callers use.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub unique_id: Uuid,
    pub user: String,
    pub prompt: String,
    pub task_type: String,
    pub fee: Option<f64>,
    pub fee_unit: Option<String>,
    pub solver: Option<String>,
    pub solution: Option<String>,
    pub solver_type: Option<Vec<String>>,
    pub optimized_prompt: Option<String>,
    pub coupon: Option<String>,
    pub review: Option<String>,
    pub solved_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A task is unsolved while `solution` is null or the empty string.
    pub fn is_solved(&self) -> bool {
        self.solution.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The pre-assigned solver, if the task was created with one.
    pub fn designated_solver(&self) -> Option<&str> {
        self.solver.as_deref().filter(|s| !s.is_empty())
    }

    pub fn coupon_addr(&self) -> Option<&str> {
        self.coupon.as_deref().filter(|c| !c.is_empty())
    }
}

/// Insert payload for the ledger; validated before it reaches storage.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user: String,
    pub prompt: String,
    pub task_type: String,
    pub solver: Option<String>,
    pub coupon: Option<String>,
    pub fee: Option<f64>,
    pub fee_unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with_solution(solution: Option<&str>) -> Task {
        Task {
            id: 1,
            unique_id: Uuid::new_v4(),
            user: "u1".to_string(),
            prompt: "generate a pic about cat girl".to_string(),
            task_type: "img".to_string(),
            fee: None,
            fee_unit: None,
            solver: None,
            solution: solution.map(String::from),
            solver_type: None,
            optimized_prompt: None,
            coupon: None,
            review: None,
            solved_at: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_string_counts_as_unsolved() {
        assert!(!task_with_solution(None).is_solved());
        assert!(!task_with_solution(Some("")).is_solved());
        assert!(task_with_solution(Some("a result")).is_solved());
    }

    #[test]
    fn empty_solver_is_not_designated() {
        let mut task = task_with_solution(None);
        task.solver = Some(String::new());
        assert_eq!(task.designated_solver(), None);
        task.solver = Some("0xabc".to_string());
        assert_eq!(task.designated_solver(), Some("0xabc"));
    }
}
