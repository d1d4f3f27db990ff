//! Client account operations

use super::{RepoError, RepoResult};
use sqlx::SqliteExecutor;

pub async fn create(ex: impl SqliteExecutor<'_>, email: &str, name: &str, now: i64) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, name, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(email)
    .bind(name)
    .bind(now)
    .fetch_one(ex)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("user email {email}")),
        other => other,
    })?;
    Ok(id)
}
