//! UserRole Repository
//!
//! At most one row per actor. Replacement happens inside the caller's
//! transaction so readers never see the actor without a role.

use super::RepoResult;
use shared::models::{ActorRef, Role, UserRole};
use sqlx::SqliteExecutor;

/// Replace the actor's role assignment
pub async fn replace(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    actor: ActorRef,
    role_id: i64,
    now: i64,
) -> RepoResult<UserRole> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND user_type = ?")
        .bind(actor.id)
        .bind(actor.actor_type.as_db())
        .execute(&mut **tx)
        .await?;

    let row = sqlx::query_as::<_, UserRole>(
        "INSERT INTO user_roles (user_id, user_type, role_id, created_at) VALUES (?, ?, ?, ?)
         RETURNING id, user_id, user_type, role_id, created_at",
    )
    .bind(actor.id)
    .bind(actor.actor_type.as_db())
    .bind(role_id)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

pub async fn find_for_actor(ex: impl SqliteExecutor<'_>, actor: ActorRef) -> RepoResult<Vec<UserRole>> {
    let rows = sqlx::query_as::<_, UserRole>(
        "SELECT id, user_id, user_type, role_id, created_at FROM user_roles WHERE user_id = ? AND user_type = ?",
    )
    .bind(actor.id)
    .bind(actor.actor_type.as_db())
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

/// The actor's assigned role, if any
pub async fn role_for_actor(ex: impl SqliteExecutor<'_>, actor: ActorRef) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.description, r.level
         FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ? AND ur.user_type = ?
         LIMIT 1",
    )
    .bind(actor.id)
    .bind(actor.actor_type.as_db())
    .fetch_optional(ex)
    .await?;
    Ok(role)
}
