use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::Task;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// Raw query parameters for `GET /v2/tasks`. Numeric fields arrive as
/// strings so that a bad value yields the documented `{"error": ..}`
/// body instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub unsolved: Option<String>,
    pub ascend: Option<String>,
    pub agent_addr: Option<String>,
    pub owner_addr: Option<String>,
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("limit must be a positive number between 1 and {MAX_LIMIT}")]
    InvalidLimit,
    #[error("cursor must be a valid number")]
    InvalidCursor,
}

/// Validated keyset-pagination window over the numeric task `id`.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub cursor: Option<i64>,
    pub ascend: bool,
}

impl Pagination {
    pub fn from_params(params: &ListTasksParams) -> Result<Self, PaginationError> {
        let limit = match params.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| (1..=MAX_LIMIT).contains(n))
                .ok_or(PaginationError::InvalidLimit)?,
        };

        let cursor = match params.cursor.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| PaginationError::InvalidCursor)?,
            ),
        };

        Ok(Self {
            limit,
            cursor,
            ascend: params.ascend.as_deref() == Some("true"),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub limit: i64,
    pub cursor: Option<i64>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<i64>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub data: Vec<Task>,
    pub pagination: PageInfo,
}

impl TaskPage {
    /// `has_more` is a page-fullness heuristic: a remainder of exactly
    /// `limit` rows costs the caller one extra empty-page request.
    pub fn new(data: Vec<Task>, page: Pagination) -> Self {
        let has_more = data.len() as i64 == page.limit;
        let next_cursor = if has_more {
            data.last().map(|task| task.id)
        } else {
            None
        };
        Self {
            data,
            pagination: PageInfo {
                limit: page.limit,
                cursor: page.cursor,
                next_cursor,
                has_more,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, cursor: Option<&str>) -> ListTasksParams {
        ListTasksParams {
            limit: limit.map(String::from),
            cursor: cursor.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let page = Pagination::from_params(&params(None, None)).unwrap();
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.cursor, None);
        assert!(!page.ascend);
    }

    #[test]
    fn limit_bounds_are_enforced() {
        assert!(Pagination::from_params(&params(Some("0"), None)).is_err());
        assert!(Pagination::from_params(&params(Some("1001"), None)).is_err());
        assert!(Pagination::from_params(&params(Some("abc"), None)).is_err());
        assert_eq!(
            Pagination::from_params(&params(Some("1000"), None))
                .unwrap()
                .limit,
            1000
        );
    }

    #[test]
    fn cursor_must_be_numeric() {
        assert!(Pagination::from_params(&params(None, Some("nope"))).is_err());
        assert_eq!(
            Pagination::from_params(&params(None, Some("42")))
                .unwrap()
                .cursor,
            Some(42)
        );
    }

    #[test]
    fn ascend_matches_only_the_literal_true() {
        let mut p = params(None, None);
        p.ascend = Some("true".to_string());
        assert!(Pagination::from_params(&p).unwrap().ascend);
        p.ascend = Some("TRUE".to_string());
        assert!(!Pagination::from_params(&p).unwrap().ascend);
    }
}
