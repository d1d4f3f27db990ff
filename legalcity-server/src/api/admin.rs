//! Administration endpoints (lawyer lifecycle, role grants, audit log)

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Permission, Role, RoleWithPermissions, TierChange};
use validator::Validate;

use super::ApiResult;
use super::extract::{AppJson, AppPath, AppQuery};
use crate::auth::ActorIdentity;
use crate::db::{self, audit::AuditEntry};
use crate::error::{ServiceError, ServiceResult};
use crate::services::role_assignment::{self, Assignment, StatusChange, Trigger};
use crate::state::AppState;

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::validation(errors.to_string())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLawyerRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// POST /api/admin/lawyers
pub async fn create_lawyer(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppJson(mut req): AppJson<CreateLawyerRequest>,
) -> ServiceResult<Json<Assignment>> {
    req.email = req.email.trim().to_string();
    req.name = req.name.trim().to_string();
    req.validate().map_err(validation_error)?;
    let assignment = role_assignment::register_lawyer(
        &state.pool,
        &state.plans,
        &req.email,
        &req.name,
        Some(identity.actor()),
    )
    .await
    .map_err(|e| match e {
        role_assignment::AssignmentError::Repo(db::RepoError::Duplicate(_)) => {
            ServiceError::App(AppError::new(ErrorCode::LawyerEmailExists).with_detail("email", req.email.clone()))
        }
        other => other.into(),
    })?;
    Ok(Json(assignment))
}

/// POST /api/admin/lawyers/{id}/verify
pub async fn verify_lawyer(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppPath(lawyer_id): AppPath<i64>,
) -> ServiceResult<Json<Assignment>> {
    let change = StatusChange::verify(Some(identity.actor()));
    let assignment = role_assignment::apply_status(&state.pool, &state.plans, lawyer_id, change).await?;
    Ok(Json(assignment))
}

/// PUT /api/admin/lawyers/{id}/tier
pub async fn change_tier(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppPath(lawyer_id): AppPath<i64>,
    AppJson(req): AppJson<TierChange>,
) -> ServiceResult<Json<Assignment>> {
    let tier = req.parsed().ok_or_else(|| {
        AppError::with_message(
            ErrorCode::UnknownTier,
            format!("Unknown subscription tier '{}'", req.tier),
        )
        .with_detail("tier", req.tier.clone())
    })?;
    let change = StatusChange::tier(tier, Trigger::TierChanged, Some(identity.actor()));
    let assignment = role_assignment::apply_status(&state.pool, &state.plans, lawyer_id, change).await?;
    Ok(Json(assignment))
}

/// POST /api/admin/lawyers/{id}/reassign
pub async fn reassign(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppPath(lawyer_id): AppPath<i64>,
) -> ServiceResult<Json<Assignment>> {
    let change = StatusChange::recompute(Some(identity.actor()));
    let assignment = role_assignment::apply_status(&state.pool, &state.plans, lawyer_id, change).await?;
    Ok(Json(assignment))
}

/// GET /api/admin/roles
pub async fn list_roles(State(state): State<AppState>) -> ServiceResult<Json<Vec<RoleWithPermissions>>> {
    let roles = db::roles::list(&state.pool).await?;
    let mut out = Vec::with_capacity(roles.len());
    for role in roles {
        let permissions = db::permissions::for_role(&state.pool, role.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        out.push(RoleWithPermissions { role, permissions });
    }
    Ok(Json(out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantRequest {
    #[validate(length(min = 1, max = 64))]
    pub action: String,
    #[validate(length(min = 1, max = 64))]
    pub resource: String,
}

#[derive(Debug, Serialize)]
pub struct GrantResult {
    pub role: String,
    pub permission: String,
    /// Whether the grant table changed
    pub changed: bool,
}

async fn role_by_name(state: &AppState, name: &str) -> ServiceResult<Role> {
    db::roles::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound).with_detail("role", name).into())
}

/// POST /api/admin/roles/{name}/permissions
pub async fn grant_permission(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppPath(role_name): AppPath<String>,
    AppJson(req): AppJson<GrantRequest>,
) -> ServiceResult<Json<GrantResult>> {
    req.validate().map_err(validation_error)?;
    let role = role_by_name(&state, &role_name).await?;
    let permission = db::permissions::find_or_create(&state.pool, &req.action, &req.resource)
        .await
        .map_err(|e| match e {
            db::RepoError::Validation(msg) => {
                ServiceError::App(AppError::with_message(ErrorCode::PermissionInvalid, msg))
            }
            other => other.into(),
        })?;
    let changed = db::permissions::grant(&state.pool, role.id, permission.id).await?;

    if changed {
        record_grant_change(&state, &identity, "permission_granted", &role, &permission).await?;
    }

    Ok(Json(GrantResult {
        role: role.name,
        permission: permission.name,
        changed,
    }))
}

/// DELETE /api/admin/roles/{name}/permissions
pub async fn revoke_permission(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppPath(role_name): AppPath<String>,
    AppJson(req): AppJson<GrantRequest>,
) -> ServiceResult<Json<GrantResult>> {
    req.validate().map_err(validation_error)?;
    let role = role_by_name(&state, &role_name).await?;
    let name = Permission::derive_name(&req.action, &req.resource);

    let changed = match db::permissions::find_by_name(&state.pool, &name).await? {
        Some(permission) => {
            let changed = db::permissions::revoke(&state.pool, role.id, permission.id).await?;
            if changed {
                record_grant_change(&state, &identity, "permission_revoked", &role, &permission)
                    .await?;
            }
            changed
        }
        None => false,
    };

    Ok(Json(GrantResult {
        role: role.name,
        permission: name,
        changed,
    }))
}

async fn record_grant_change(
    state: &AppState,
    identity: &ActorIdentity,
    action: &str,
    role: &Role,
    permission: &Permission,
) -> ServiceResult<()> {
    let detail = serde_json::json!({ "role": role.name, "permission": permission.name });
    db::audit::log(
        &state.pool,
        Some(identity.actor()),
        action,
        Some(&detail),
        shared::util::now_millis(),
    )
    .await?;
    tracing::info!(role = %role.name, permission = %permission.name, action, "Role grants changed");
    Ok(())
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/admin/audit-log
pub async fn audit_log(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AuditQuery>,
) -> ApiResult<Vec<AuditEntry>> {
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(per_page);

    let entries = db::audit::query(&state.pool, per_page, offset)
        .await
        .map_err(|e| {
            tracing::error!("Audit log query error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    Ok(Json(entries))
}
