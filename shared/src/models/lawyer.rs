//! Lawyer and client account models

use serde::{Deserialize, Serialize};

use super::plan::{PlanRestrictions, SubscriptionTier};

/// Lawyer account row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Lawyer {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_verified: bool,
    /// Tier as stored (lowercase), see [`SubscriptionTier::from_db`]
    pub subscription_tier: String,
    /// JSON object of feature flags, rebuilt from the tier template
    pub plan_restrictions: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_expires_at: Option<i64>,
    pub created_at: i64,
}

impl Lawyer {
    /// Parsed tier; unknown stored values read as `free`
    pub fn tier(&self) -> SubscriptionTier {
        SubscriptionTier::from_db(&self.subscription_tier).unwrap_or(SubscriptionTier::Free)
    }

    /// Parsed restrictions, `None` when missing or malformed
    pub fn restrictions(&self) -> Option<PlanRestrictions> {
        self.plan_restrictions
            .as_deref()
            .and_then(|blob| PlanRestrictions::from_blob(blob).ok())
    }
}

/// Change tier payload. Kept as text so an unknown tier is reported as such.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierChange {
    pub tier: String,
}

impl TierChange {
    pub fn parsed(&self) -> Option<SubscriptionTier> {
        SubscriptionTier::from_db(self.tier.trim())
    }
}
