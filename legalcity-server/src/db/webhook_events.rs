//! Processed Stripe webhook events (idempotency ledger)

use super::RepoResult;
use sqlx::SqlitePool;

/// Record an event id. Returns `false` when it was already processed.
///
/// Insert-first, so two deliveries of the same event cannot both proceed.
pub async fn record(pool: &SqlitePool, event_id: &str, event_type: &str, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Forget an event so a redelivery is processed again
pub async fn forget(pool: &SqlitePool, event_id: &str) -> RepoResult<()> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_id = ?")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn test_record_once() {
        let pool = test_support::pool().await;
        assert!(record(&pool, "evt_1", "invoice.paid", 1).await.unwrap());
        assert!(!record(&pool, "evt_1", "invoice.paid", 2).await.unwrap());
        forget(&pool, "evt_1").await.unwrap();
        assert!(record(&pool, "evt_1", "invoice.paid", 3).await.unwrap());
    }
}
