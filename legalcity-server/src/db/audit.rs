//! Audit log operations

use super::RepoResult;
use shared::models::ActorRef;
use sqlx::{SqliteExecutor, SqlitePool};

/// Write an audit log entry
pub async fn log(
    ex: impl SqliteExecutor<'_>,
    actor: Option<ActorRef>,
    action: &str,
    detail: Option<&serde_json::Value>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (actor_id, actor_type, action, detail, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(actor.map(|a| a.id))
    .bind(actor.map(|a| a.actor_type.as_db()))
    .bind(action)
    .bind(detail)
    .bind(now)
    .execute(ex)
    .await?;
    Ok(())
}

/// Audit log entry
#[derive(sqlx::FromRow, serde::Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub actor_type: Option<String>,
    pub action: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: i64,
}

/// Query audit log entries, newest first (paginated)
pub async fn query(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<AuditEntry>> {
    let rows: Vec<AuditEntry> = sqlx::query_as(
        "SELECT id, actor_id, actor_type, action, detail, created_at FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
