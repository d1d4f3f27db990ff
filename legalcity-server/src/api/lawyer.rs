//! Feature-gated lawyer endpoints
//!
//! Each route stacks an RBAC permission and a plan feature (see `api::router`).

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Lawyer, SubscriptionTier};

use super::ApiResult;
use crate::auth::ActorIdentity;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

async fn load_lawyer(state: &AppState, identity: &ActorIdentity) -> Result<Lawyer, AppError> {
    db::lawyers::find_by_id(&state.pool, identity.actor_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::LawyerNotFound))
}

#[derive(Debug, Serialize)]
pub struct PayoutEligibility {
    pub lawyer_id: i64,
    pub stripe_customer_linked: bool,
    pub subscription_status: Option<String>,
    pub eligible: bool,
}

/// GET /api/lawyer/payouts/eligibility
pub async fn payout_eligibility(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
) -> ApiResult<PayoutEligibility> {
    let lawyer = load_lawyer(&state, &identity).await?;
    let linked = lawyer.stripe_customer_id.is_some();
    let active = matches!(
        lawyer.subscription_status.as_deref(),
        Some("active") | Some("trialing")
    );

    Ok(Json(PayoutEligibility {
        lawyer_id: lawyer.id,
        stripe_customer_linked: linked,
        eligible: linked && active,
        subscription_status: lawyer.subscription_status,
    }))
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub lawyer_id: i64,
    pub subscription_tier: SubscriptionTier,
    pub is_verified: bool,
    pub enabled_features: Vec<shared::models::Feature>,
    pub subscription_expires_at: Option<i64>,
    pub member_since: i64,
}

/// GET /api/lawyer/analytics/summary
pub async fn analytics_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
) -> ApiResult<AnalyticsSummary> {
    let lawyer = load_lawyer(&state, &identity).await?;

    Ok(Json(AnalyticsSummary {
        lawyer_id: lawyer.id,
        subscription_tier: lawyer.tier(),
        is_verified: lawyer.is_verified,
        enabled_features: lawyer
            .restrictions()
            .map(|r| r.enabled_features())
            .unwrap_or_default(),
        subscription_expires_at: lawyer.subscription_expires_at,
        member_since: lawyer.created_at,
    }))
}
