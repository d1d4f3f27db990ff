//! Role assignment from verification status and subscription tier
//!
//! Every lifecycle trigger (account creation, verification approval, tier
//! change, expiry or downgrade) goes through [`apply_status`], which rewrites
//! the lawyer's tier, plan restrictions and role in one transaction. Each
//! recompute fully overwrites the previous state.

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActorRef, ActorType, Lawyer, PlanRestrictions, Role, SubscriptionTier, role_names,
};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{self, RepoError};
use crate::error::ServiceError;
use crate::plans::PlanCatalog;

/// Assignment errors
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// A seeded role is missing. Deployment fault, never defaulted.
    #[error("role not found: {0}")]
    RoleNotFound(&'static str),

    #[error("lawyer {0} not found")]
    LawyerNotFound(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("failed to encode plan restrictions: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AssignmentError {
    fn from(e: sqlx::Error) -> Self {
        AssignmentError::Repo(e.into())
    }
}

impl From<AssignmentError> for ServiceError {
    fn from(e: AssignmentError) -> Self {
        match e {
            AssignmentError::RoleNotFound(role) => {
                tracing::error!(role, "Seeded role missing, role assignment aborted");
                ServiceError::App(
                    AppError::config(format!("Role '{role}' is not configured"))
                        .with_detail("role", role),
                )
            }
            AssignmentError::LawyerNotFound(id) => ServiceError::App(
                AppError::new(ErrorCode::LawyerNotFound).with_detail("lawyer_id", id),
            ),
            AssignmentError::Repo(e) => e.into(),
            AssignmentError::Encode(e) => ServiceError::Db(e.into()),
        }
    }
}

/// What caused a recompute (recorded as the audit action)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Created,
    Verified,
    TierChanged,
    Expired,
    Downgraded,
    Reassigned,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "lawyer_created",
            Self::Verified => "lawyer_verified",
            Self::TierChanged => "tier_changed",
            Self::Expired => "subscription_expired",
            Self::Downgraded => "subscription_downgraded",
            Self::Reassigned => "role_reassigned",
        }
    }
}

/// Requested status change; `None` keeps the stored value
#[derive(Debug, Clone, Copy)]
pub struct StatusChange {
    pub is_verified: Option<bool>,
    pub tier: Option<SubscriptionTier>,
    pub trigger: Trigger,
    /// Who caused the change, recorded in the audit log
    pub performed_by: Option<ActorRef>,
    /// Drop the stored paid-through timestamp
    pub clear_expiry: bool,
}

impl StatusChange {
    pub fn verify(performed_by: Option<ActorRef>) -> Self {
        Self {
            is_verified: Some(true),
            tier: None,
            trigger: Trigger::Verified,
            performed_by,
            clear_expiry: false,
        }
    }

    /// Tier change that discards the stored expiry
    pub fn tier(tier: SubscriptionTier, trigger: Trigger, performed_by: Option<ActorRef>) -> Self {
        Self {
            is_verified: None,
            tier: Some(tier),
            trigger,
            performed_by,
            clear_expiry: true,
        }
    }

    /// Keep the stored expiry (it was just set from the payment provider)
    pub fn keep_expiry(mut self) -> Self {
        self.clear_expiry = false;
        self
    }

    pub fn recompute(performed_by: Option<ActorRef>) -> Self {
        Self {
            is_verified: None,
            tier: None,
            trigger: Trigger::Reassigned,
            performed_by,
            clear_expiry: false,
        }
    }
}

/// Outcome of a recompute
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub lawyer_id: i64,
    pub role: String,
    pub is_verified: bool,
    pub tier: SubscriptionTier,
    pub plan_restrictions: PlanRestrictions,
}

/// Pick the lawyer role for a verification status and tier.
///
/// Verification gates everything: an unverified premium lawyer is `lawyer`.
pub fn select_role(is_verified: bool, tier: SubscriptionTier) -> &'static str {
    match (is_verified, tier) {
        (true, SubscriptionTier::Premium) => role_names::PREMIUM_LAWYER,
        (true, _) => role_names::VERIFIED_LAWYER,
        (false, _) => role_names::LAWYER,
    }
}

/// Fixed role for non-lawyer actors
fn fixed_role(actor_type: ActorType) -> Option<&'static str> {
    match actor_type {
        ActorType::User => Some(role_names::USER),
        ActorType::Admin => Some(role_names::ADMIN),
        ActorType::Lawyer => None,
    }
}

async fn replace_role(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    actor: ActorRef,
    role_name: &'static str,
    now: i64,
) -> Result<Role, AssignmentError> {
    let role = db::roles::find_by_name(&mut **tx, role_name)
        .await?
        .ok_or(AssignmentError::RoleNotFound(role_name))?;
    db::user_roles::replace(tx, actor, role.id, now).await?;
    Ok(role)
}

/// Recompute the lawyer's role from stored verification and tier.
///
/// Idempotent: the lawyer ends with exactly one role row.
pub async fn assign_role_based_on_status(
    pool: &SqlitePool,
    lawyer_id: i64,
) -> Result<Role, AssignmentError> {
    let mut tx = pool.begin().await?;
    let lawyer = db::lawyers::find_by_id(&mut *tx, lawyer_id)
        .await?
        .ok_or(AssignmentError::LawyerNotFound(lawyer_id))?;

    let role_name = select_role(lawyer.is_verified, lawyer.tier());
    let role = replace_role(&mut tx, ActorRef::lawyer(lawyer_id), role_name, shared::util::now_millis()).await?;
    tx.commit().await?;

    tracing::debug!(lawyer_id, role = %role.name, "Role assigned");
    Ok(role)
}

async fn apply_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    catalog: &PlanCatalog,
    lawyer: &Lawyer,
    change: StatusChange,
    now: i64,
) -> Result<Assignment, AssignmentError> {
    let is_verified = change.is_verified.unwrap_or(lawyer.is_verified);
    let tier = change.tier.unwrap_or_else(|| lawyer.tier());
    let restrictions = catalog.template(tier);

    db::lawyers::update_status(
        &mut **tx,
        lawyer.id,
        is_verified,
        tier,
        &restrictions.to_blob()?,
        change.clear_expiry,
    )
    .await?;
    let role = replace_role(tx, ActorRef::lawyer(lawyer.id), select_role(is_verified, tier), now).await?;

    let detail = serde_json::json!({
        "lawyer_id": lawyer.id,
        "from_tier": lawyer.subscription_tier,
        "to_tier": tier,
        "is_verified": is_verified,
        "role": role.name,
    });
    db::audit::log(&mut **tx, change.performed_by, change.trigger.as_str(), Some(&detail), now).await?;

    Ok(Assignment {
        lawyer_id: lawyer.id,
        role: role.name,
        is_verified,
        tier,
        plan_restrictions: restrictions,
    })
}

/// Apply a lifecycle change: status, restrictions and role in one transaction
pub async fn apply_status(
    pool: &SqlitePool,
    catalog: &PlanCatalog,
    lawyer_id: i64,
    change: StatusChange,
) -> Result<Assignment, AssignmentError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let lawyer = db::lawyers::find_by_id(&mut *tx, lawyer_id)
        .await?
        .ok_or(AssignmentError::LawyerNotFound(lawyer_id))?;

    let assignment = apply_in_tx(&mut tx, catalog, &lawyer, change, now).await?;
    tx.commit().await?;

    tracing::info!(
        lawyer_id,
        trigger = change.trigger.as_str(),
        tier = %assignment.tier,
        role = %assignment.role,
        "Lawyer access recomputed"
    );
    Ok(assignment)
}

/// Create a free, unverified lawyer and run the initial assignment
pub async fn register_lawyer(
    pool: &SqlitePool,
    catalog: &PlanCatalog,
    email: &str,
    name: &str,
    performed_by: Option<ActorRef>,
) -> Result<Assignment, AssignmentError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let id = db::lawyers::create(&mut *tx, email, name, now).await?;
    let lawyer = db::lawyers::find_by_id(&mut *tx, id)
        .await?
        .ok_or(AssignmentError::LawyerNotFound(id))?;

    let change = StatusChange {
        is_verified: None,
        tier: None,
        trigger: Trigger::Created,
        performed_by,
        clear_expiry: false,
    };
    let assignment = apply_in_tx(&mut tx, catalog, &lawyer, change, now).await?;
    tx.commit().await?;

    tracing::info!(lawyer_id = id, "Lawyer registered");
    Ok(assignment)
}

/// Give a non-lawyer actor its fixed role; lawyers are recomputed from status
pub async fn assign_fixed_role(pool: &SqlitePool, actor: ActorRef) -> Result<Role, AssignmentError> {
    let Some(role_name) = fixed_role(actor.actor_type) else {
        return assign_role_based_on_status(pool, actor.id).await;
    };

    let mut tx = pool.begin().await?;
    let role = replace_role(&mut tx, actor, role_name, shared::util::now_millis()).await?;
    tx.commit().await?;
    Ok(role)
}

/// Create a marketplace client with the `user` role
pub async fn register_user(pool: &SqlitePool, email: &str, name: &str) -> Result<ActorRef, AssignmentError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let id = db::users::create(&mut *tx, email, name, now).await?;
    let actor = ActorRef::new(id, ActorType::User);
    replace_role(&mut tx, actor, role_names::USER, now).await?;
    tx.commit().await?;
    Ok(actor)
}
