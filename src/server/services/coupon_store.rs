use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::server::models::{Coupon, VoteDirection};

/// Coupon rows and their single-shot flag transitions. Every flag
/// update is guarded on the flag still being false, so a coupon can be
/// consumed at most once per action even under concurrent requests.
pub struct CouponService {
    pool: PgPool,
}

impl CouponService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, addr: &str, priv_key: &str) -> Result<Coupon> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            INSERT INTO coupons (addr, "priv")
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(addr)
        .bind(priv_key)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create coupon")?;

        Ok(coupon)
    }

    pub async fn get_by_addr(&self, addr: &str) -> Result<Option<Coupon>> {
        let coupon =
            sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE LOWER(addr) = LOWER($1)")
                .bind(addr)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch coupon")?;

        Ok(coupon)
    }

    /// Mark the coupon consumed by a solve and record its owner.
    pub async fn mark_used(&self, addr: &str, owner: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE coupons
            SET if_used = TRUE, owner = $2
            WHERE LOWER(addr) = LOWER($1) AND if_used = FALSE
            "#,
        )
        .bind(addr)
        .bind(owner)
        .execute(&self.pool)
        .await
        .context("Failed to update coupon")?;

        Ok(())
    }

    pub async fn mark_reviewed(&self, addr: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE coupons
            SET if_reviewed = TRUE
            WHERE LOWER(addr) = LOWER($1) AND if_reviewed = FALSE
            "#,
        )
        .bind(addr)
        .execute(&self.pool)
        .await
        .context("Failed to update coupon")?;

        Ok(())
    }

    /// Claim the coupon's single vote. The direction is persisted so a
    /// losing second vote can see what the first one was. Returns the
    /// updated coupon, or `None` if the vote was already claimed.
    pub async fn claim_vote(
        &self,
        addr: &str,
        direction: VoteDirection,
    ) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            UPDATE coupons
            SET if_voted = TRUE, vote = $2
            WHERE LOWER(addr) = LOWER($1) AND if_voted = FALSE
            RETURNING *
            "#,
        )
        .bind(addr)
        .bind(direction.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to record vote")?;

        Ok(coupon)
    }
}
