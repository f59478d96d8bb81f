use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::{config::AppState, errors::ApiError, services::solver_auth};

#[derive(Debug, Deserialize)]
pub struct GenerateCouponRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateCouponResponse {
    pub coupon: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Admin-gated coupon minting: a fresh keypair whose address becomes
/// the coupon identity. The private key is handed to the coupon holder
/// and gates the review and vote actions.
pub async fn generate_coupon(
    State(state): State<AppState>,
    Json(request): Json<GenerateCouponRequest>,
) -> Result<(StatusCode, Json<GenerateCouponResponse>), ApiError> {
    check_admin(&state, request.password.as_deref())?;

    let (privkey, addr) = solver_auth::generate_keypair();
    let coupon = state.coupons.create(&addr, &privkey).await?;

    info!("generated coupon {}", coupon.addr);
    Ok((
        StatusCode::CREATED,
        Json(GenerateCouponResponse {
            coupon: coupon.addr,
            private_key: privkey,
            created_at: coupon.created_at,
        }),
    ))
}

fn check_admin(state: &AppState, password: Option<&str>) -> Result<(), ApiError> {
    match (&state.config.admin_pwd, password) {
        (Some(expected), Some(given)) if expected == given => Ok(()),
        _ => Err(ApiError::Unauthorized(
            "Unauthorized: Invalid password".to_string(),
        )),
    }
}
