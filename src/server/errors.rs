use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::error;

/// Error taxonomy shared by every route. `Conflict` deliberately maps to
/// 400 rather than 409: that is the public contract callers already
/// depend on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let details = match &self {
            ApiError::Validation { details, .. } => details.clone(),
            ApiError::Conflict { details, .. } | ApiError::Forbidden { details, .. } => {
                Some(details.clone())
            }
            ApiError::Upstream(err) => {
                error!("upstream failure: {:?}", err);
                None
            }
            _ => None,
        };

        // `Upstream` exposes only the outermost context string, never the
        // underlying error chain.
        let mut body = Map::new();
        body.insert("error".to_string(), json!(self.to_string()));
        if let Some(Value::Object(extra)) = details {
            body.extend(extra);
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::conflict("done", json!({})).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::forbidden("no", json!({})).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Unauthorized("nope".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Upstream(anyhow!("db down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conflict_details_merge_into_body() {
        let err = ApiError::conflict(
            "Task already has a solution",
            json!({"existingSolution": {"solver": "0xabc"}}),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_displays_outer_context_only() {
        let err = ApiError::Upstream(anyhow!("connection refused").context("Failed to fetch task"));
        assert_eq!(err.to_string(), "Failed to fetch task");
    }
}
