//! Subscription lifecycle: Stripe status mapping and lapsed-plan expiry

use shared::models::SubscriptionTier;
use sqlx::SqlitePool;

use super::role_assignment::{self, AssignmentError, StatusChange, Trigger};
use crate::db;
use crate::plans::PlanCatalog;

/// Tier implied by a Stripe subscription status.
///
/// `None` means the status does not change entitlements (e.g. `incomplete`).
pub fn tier_for_status(status: &str, priced_tier: SubscriptionTier) -> Option<SubscriptionTier> {
    match status {
        "active" | "trialing" => Some(priced_tier),
        "past_due" | "unpaid" | "canceled" | "incomplete_expired" => Some(SubscriptionTier::Free),
        _ => None,
    }
}

/// Downgrade every paid lawyer whose subscription ended before `now`.
///
/// Returns the downgraded lawyer ids. One failing lawyer does not stop the
/// sweep; the first error is returned after the rest are processed.
pub async fn expire_lapsed(
    pool: &SqlitePool,
    catalog: &PlanCatalog,
    now: i64,
) -> Result<Vec<i64>, AssignmentError> {
    let lapsed = db::lawyers::find_lapsed(pool, now).await?;
    let mut expired = Vec::with_capacity(lapsed.len());
    let mut first_error = None;

    for lawyer_id in lapsed {
        let change = StatusChange::tier(SubscriptionTier::Free, Trigger::Expired, None);
        match role_assignment::apply_status(pool, catalog, lawyer_id, change).await {
            Ok(_) => expired.push(lawyer_id),
            Err(e) => {
                tracing::error!(lawyer_id, error = %e, "Failed to expire lapsed subscription");
                first_error.get_or_insert(e);
            }
        }
    }

    if !expired.is_empty() {
        tracing::info!(count = expired.len(), "Expired lapsed subscriptions");
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(expired),
    }
}
