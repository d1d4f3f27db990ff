//! Permission Repository
//!
//! Permission rows are created lazily the first time a grant names an
//! (action, resource) pair. Grants are unique per (role, permission).

use super::{RepoError, RepoResult};
use shared::models::{ActorRef, Permission, is_valid_segment};
use sqlx::{SqliteExecutor, SqlitePool};

/// Find the permission for `(action, resource)`, creating it if absent.
///
/// Concurrent creators race on the UNIQUE name; the loser's insert is
/// absorbed by `ON CONFLICT` and both read the same row.
pub async fn find_or_create(pool: &SqlitePool, action: &str, resource: &str) -> RepoResult<Permission> {
    if !is_valid_segment(action) {
        return Err(RepoError::Validation(format!("invalid permission action: {action:?}")));
    }
    if !is_valid_segment(resource) {
        return Err(RepoError::Validation(format!(
            "invalid permission resource: {resource:?}"
        )));
    }

    let name = Permission::derive_name(action, resource);
    sqlx::query(
        "INSERT INTO permissions (action, resource, name) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(action)
    .bind(resource)
    .bind(&name)
    .execute(pool)
    .await?;

    find_by_name(pool, &name)
        .await?
        .ok_or_else(|| RepoError::Database(format!("permission {name} vanished after insert")))
}

pub async fn find_by_name(ex: impl SqliteExecutor<'_>, name: &str) -> RepoResult<Option<Permission>> {
    let perm = sqlx::query_as::<_, Permission>(
        "SELECT id, action, resource, name FROM permissions WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(ex)
    .await?;
    Ok(perm)
}

/// Grant a permission to a role. Returns `false` if it was already granted.
pub async fn grant(pool: &SqlitePool, role_id: i64, permission_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Revoke a permission from a role. Returns `false` if it was not granted.
pub async fn revoke(pool: &SqlitePool, role_id: i64, permission_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
        .bind(role_id)
        .bind(permission_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn for_role(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<Permission>> {
    let perms = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.action, p.resource, p.name
         FROM permissions p
         JOIN role_permissions rp ON rp.permission_id = p.id
         WHERE rp.role_id = ?
         ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(perms)
}

/// Permissions reachable from the actor's assigned role
pub async fn for_actor(pool: &SqlitePool, actor: ActorRef) -> RepoResult<Vec<Permission>> {
    let perms = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.action, p.resource, p.name
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         JOIN role_permissions rp ON rp.role_id = r.id
         JOIN permissions p ON p.id = rp.permission_id
         WHERE ur.user_id = ? AND ur.user_type = ?
         ORDER BY p.name",
    )
    .bind(actor.id)
    .bind(actor.actor_type.as_db())
    .fetch_all(pool)
    .await?;
    Ok(perms)
}
