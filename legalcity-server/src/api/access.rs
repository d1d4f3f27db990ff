//! Caller access introspection
//!
//! GET /api/me/access: role, permissions and plan restrictions
//! GET /api/access/check: evaluate both gates for one (action, resource, feature)

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{ActorType, PlanRestrictions, SubscriptionTier};

use super::ApiResult;
use super::extract::AppQuery;
use crate::auth::{ActorIdentity, restrictions_allow};
use crate::db;
use crate::error::ServiceError;
use crate::services::authorization;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccessSummary {
    pub actor_id: i64,
    pub actor_type: ActorType,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<SubscriptionTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_restrictions: Option<PlanRestrictions>,
}

/// GET /api/me/access
pub async fn my_access(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
) -> ApiResult<AccessSummary> {
    let actor = identity.actor();
    let role = db::user_roles::role_for_actor(&state.pool, actor)
        .await
        .map_err(ServiceError::from)?;
    let permissions = authorization::resolve(&state.pool, actor)
        .await
        .map_err(ServiceError::from)?;

    let (subscription_tier, plan_restrictions) = match identity.actor_type {
        ActorType::Lawyer => {
            let lawyer = db::lawyers::find_by_id(&state.pool, identity.actor_id)
                .await
                .map_err(ServiceError::from)?
                .ok_or_else(|| AppError::new(ErrorCode::LawyerNotFound))?;
            (Some(lawyer.tier()), lawyer.restrictions())
        }
        _ => (None, None),
    };

    Ok(Json(AccessSummary {
        actor_id: identity.actor_id,
        actor_type: identity.actor_type,
        role: role.map(|r| r.name),
        permissions: permissions.names(),
        subscription_tier,
        plan_restrictions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub action: String,
    pub resource: String,
    pub feature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// RBAC gate
    pub permitted: bool,
    /// Plan gate; `None` when no feature was asked about
    pub feature_enabled: Option<bool>,
    /// Both gates passed
    pub allowed: bool,
}

/// GET /api/access/check
pub async fn check(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    AppQuery(query): AppQuery<CheckQuery>,
) -> ApiResult<CheckResult> {
    let permissions = authorization::resolve(&state.pool, identity.actor())
        .await
        .map_err(ServiceError::from)?;
    let permitted = permissions.allows(&query.action, &query.resource);

    let feature_enabled = match query.feature.as_deref() {
        None => None,
        Some(_) if identity.actor_type != ActorType::Lawyer => Some(false),
        Some(feature) => {
            let blob = db::lawyers::restrictions_blob(&state.pool, identity.actor_id)
                .await
                .map_err(ServiceError::from)?
                .flatten();
            Some(blob.is_some_and(|b| restrictions_allow(&b, feature)))
        }
    };

    Ok(Json(CheckResult {
        permitted,
        feature_enabled,
        allowed: permitted && feature_enabled.unwrap_or(true),
    }))
}
