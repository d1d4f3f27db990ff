//! Role Repository
//!
//! Roles are seeded by migration; only their grants change at runtime.

use super::RepoResult;
use shared::models::Role;
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn list(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, level FROM roles ORDER BY level DESC, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

pub async fn find_by_id(ex: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, level FROM roles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(ex)
    .await?;
    Ok(role)
}

pub async fn find_by_name(ex: impl SqliteExecutor<'_>, name: &str) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, description, level FROM roles WHERE name = ? LIMIT 1",
    )
    .bind(name)
    .fetch_optional(ex)
    .await?;
    Ok(role)
}
