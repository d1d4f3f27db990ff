//! Lawyer account operations

use super::{RepoError, RepoResult};
use shared::models::{Lawyer, SubscriptionTier};
use sqlx::{SqliteExecutor, SqlitePool};

const LAWYER_COLUMNS: &str = "id, email, name, is_verified, subscription_tier, plan_restrictions, \
     stripe_customer_id, stripe_subscription_id, subscription_status, subscription_expires_at, created_at";

/// Insert a new free, unverified lawyer. Restrictions are filled by the
/// first assignment in the same transaction.
pub async fn create(
    ex: impl SqliteExecutor<'_>,
    email: &str,
    name: &str,
    now: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO lawyers (email, name, is_verified, subscription_tier, created_at)
         VALUES (?, ?, 0, 'free', ?) RETURNING id",
    )
    .bind(email)
    .bind(name)
    .bind(now)
    .fetch_one(ex)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("lawyer email {email}")),
        other => other,
    })?;
    Ok(id)
}

pub async fn find_by_id(ex: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Lawyer>> {
    let sql = format!("SELECT {LAWYER_COLUMNS} FROM lawyers WHERE id = ?");
    let lawyer = sqlx::query_as::<_, Lawyer>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(lawyer)
}

pub async fn find_by_stripe_customer(
    pool: &SqlitePool,
    customer_id: &str,
) -> RepoResult<Option<Lawyer>> {
    let sql = format!("SELECT {LAWYER_COLUMNS} FROM lawyers WHERE stripe_customer_id = ?");
    let lawyer = sqlx::query_as::<_, Lawyer>(&sql)
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;
    Ok(lawyer)
}

pub async fn find_by_stripe_subscription(
    pool: &SqlitePool,
    subscription_id: &str,
) -> RepoResult<Option<Lawyer>> {
    let sql = format!("SELECT {LAWYER_COLUMNS} FROM lawyers WHERE stripe_subscription_id = ?");
    let lawyer = sqlx::query_as::<_, Lawyer>(&sql)
        .bind(subscription_id)
        .fetch_optional(pool)
        .await?;
    Ok(lawyer)
}

/// Stored restrictions blob. Outer `None` means no such lawyer.
pub async fn restrictions_blob(pool: &SqlitePool, id: i64) -> RepoResult<Option<Option<String>>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT plan_restrictions FROM lawyers WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(blob,)| blob))
}

/// Overwrite verification, tier and the full restrictions blob.
///
/// `clear_expiry` drops the paid-through timestamp so a later sweep cannot
/// act on a period that no longer applies.
pub async fn update_status(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    is_verified: bool,
    tier: SubscriptionTier,
    restrictions_blob: &str,
    clear_expiry: bool,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE lawyers SET
            is_verified = ?,
            subscription_tier = ?,
            plan_restrictions = ?,
            subscription_expires_at = CASE WHEN ? THEN NULL ELSE subscription_expires_at END
         WHERE id = ?",
    )
    .bind(is_verified)
    .bind(tier.as_db())
    .bind(restrictions_blob)
    .bind(clear_expiry)
    .bind(id)
    .execute(ex)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Lawyer {id} not found")));
    }
    Ok(())
}

/// Record Stripe linkage; `None` fields keep their stored value
pub async fn link_stripe(
    pool: &SqlitePool,
    id: i64,
    customer_id: Option<&str>,
    subscription_id: Option<&str>,
    status: Option<&str>,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE lawyers SET
            stripe_customer_id = COALESCE(?1, stripe_customer_id),
            stripe_subscription_id = COALESCE(?2, stripe_subscription_id),
            subscription_status = COALESCE(?3, subscription_status)
         WHERE id = ?4",
    )
    .bind(customer_id)
    .bind(subscription_id)
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the paid-through timestamp (millis) for a Stripe subscription
pub async fn set_expiry_by_subscription(
    pool: &SqlitePool,
    subscription_id: &str,
    expires_at: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE lawyers SET subscription_expires_at = ? WHERE stripe_subscription_id = ?",
    )
    .bind(expires_at)
    .bind(subscription_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Paid lawyers whose subscription ended before `now`
pub async fn find_lapsed(pool: &SqlitePool, now: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT id FROM lawyers
         WHERE subscription_tier != 'free'
           AND subscription_expires_at IS NOT NULL
           AND subscription_expires_at < ?
         ORDER BY id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
