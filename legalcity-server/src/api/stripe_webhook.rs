//! Stripe webhook handler
//!
//! POST /stripe/webhook: subscription events that drive tier changes
//! (raw body for signature verification)

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{Lawyer, SubscriptionTier};

use crate::db::{self, RepoError};
use crate::services::role_assignment::{self, StatusChange, Trigger};
use crate::services::subscription::tier_for_status;
use crate::state::AppState;
use crate::stripe;

/// Handle incoming Stripe webhook events
///
/// Must receive raw body (not JSON) for HMAC signature verification.
/// Rejected deliveries get the shared JSON error body; accepted ones only a status.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    // 1. Get Stripe-Signature header
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(AppError::with_message(
            ErrorCode::WebhookSignatureInvalid,
            "Missing Stripe-Signature header",
        ));
    };

    // 2. Verify signature
    if let Err(e) = stripe::verify_webhook_signature(
        &body,
        sig_header,
        &state.stripe_webhook_secret,
        chrono::Utc::now().timestamp(),
    ) {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
    }

    // 3. Parse JSON event
    let event: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return Err(AppError::with_message(ErrorCode::WebhookPayloadInvalid, e.to_string()));
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return Err(AppError::with_message(ErrorCode::WebhookPayloadInvalid, "Event id is missing"));
    };
    tracing::info!(event_type, event_id, "Received Stripe webhook");

    // 4. Idempotency: INSERT first, check rows_affected
    match db::webhook_events::record(&state.pool, event_id, event_type, shared::util::now_millis())
        .await
    {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return Ok(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Ok(true) => {}
    }

    // 5. Handle event types
    let status = match event_type {
        "checkout.session.completed" => handle_checkout_completed(&state, &event).await,
        "customer.subscription.updated" => handle_subscription_updated(&state, &event).await,
        "customer.subscription.deleted" => handle_subscription_deleted(&state, &event).await,
        "invoice.paid" => handle_invoice_paid(&state, &event).await,
        _ => {
            tracing::debug!(event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    };

    // Let Stripe redeliver events we failed to apply
    if status.is_server_error()
        && let Err(e) = db::webhook_events::forget(&state.pool, event_id).await
    {
        tracing::error!(%e, event_id, "Failed to release webhook event for retry");
    }

    Ok(status)
}

fn event_object(event: &Value) -> Option<&Value> {
    event.get("data").and_then(|d| d.get("object"))
}

fn first_item(obj: &Value) -> Option<&Value> {
    obj.get("items")
        .and_then(|i| i.get("data"))
        .and_then(|d| d.as_array())
        .and_then(|a| a.first())
}

/// Find the lawyer a subscription object belongs to
async fn find_subscription_owner(state: &AppState, obj: &Value) -> Result<Option<Lawyer>, StatusCode> {
    if let Some(sub_id) = obj["id"].as_str() {
        match db::lawyers::find_by_stripe_subscription(&state.pool, sub_id).await {
            Ok(Some(l)) => return Ok(Some(l)),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(%e, "DB error finding lawyer by subscription");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
    let Some(customer_id) = obj["customer"].as_str() else {
        return Ok(None);
    };
    db::lawyers::find_by_stripe_customer(&state.pool, customer_id)
        .await
        .map_err(|e| {
            tracing::error!(%e, "DB error finding lawyer by Stripe customer");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn apply_tier(state: &AppState, lawyer_id: i64, change: StatusChange) -> StatusCode {
    match role_assignment::apply_status(&state.pool, &state.plans, lawyer_id, change).await {
        Ok(assignment) => {
            tracing::info!(
                lawyer_id,
                tier = %assignment.tier,
                role = %assignment.role,
                "Subscription tier applied"
            );
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(lawyer_id, error = %e, "Failed to apply subscription tier");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// checkout.session.completed → link Stripe ids + apply purchased tier
async fn handle_checkout_completed(state: &AppState, event: &Value) -> StatusCode {
    let Some(obj) = event_object(event) else {
        return StatusCode::OK;
    };
    let customer_id = obj["customer"].as_str();
    let subscription_id = obj["subscription"].as_str();
    let metadata = obj.get("metadata");

    let by_customer = match customer_id {
        Some(c) => match db::lawyers::find_by_stripe_customer(&state.pool, c).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(%e, "DB error finding lawyer by Stripe customer");
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        },
        None => None,
    };

    let lawyer = match by_customer {
        Some(l) => l,
        None => {
            // Metadata ids may arrive as strings or numbers
            let metadata_id = metadata.and_then(|m| {
                m["lawyer_id"]
                    .as_i64()
                    .or_else(|| m["lawyer_id"].as_str().and_then(|s| s.parse().ok()))
            });
            let Some(id) = metadata_id else {
                tracing::warn!(?customer_id, "checkout.session.completed without a known lawyer");
                return StatusCode::OK;
            };
            match db::lawyers::find_by_id(&state.pool, id).await {
                Ok(Some(l)) => l,
                Ok(None) => {
                    tracing::warn!(lawyer_id = id, "Checkout for unknown lawyer");
                    return StatusCode::OK;
                }
                Err(e) => {
                    tracing::error!(%e, "DB error finding lawyer");
                    return StatusCode::INTERNAL_SERVER_ERROR;
                }
            }
        }
    };

    let Some(tier) = metadata
        .and_then(|m| m["tier"].as_str())
        .and_then(SubscriptionTier::from_db)
    else {
        tracing::warn!(lawyer_id = lawyer.id, "checkout.session.completed missing or unknown tier");
        return StatusCode::OK;
    };

    if let Err(status) = link_checkout(state, lawyer.id, customer_id, subscription_id).await {
        return status;
    }

    // New period: the expiry arrives with the next invoice or subscription update
    let change = StatusChange::tier(tier, Trigger::TierChanged, None);
    apply_tier(state, lawyer.id, change).await
}

/// Record the checkout's Stripe ids on the lawyer.
///
/// A customer already linked to another lawyer cannot be resolved by
/// redelivery, so it is logged and the event acknowledged.
async fn link_checkout(
    state: &AppState,
    lawyer_id: i64,
    customer_id: Option<&str>,
    subscription_id: Option<&str>,
) -> Result<(), StatusCode> {
    match db::lawyers::link_stripe(&state.pool, lawyer_id, customer_id, subscription_id, Some("active")).await {
        Ok(()) => Ok(()),
        Err(RepoError::Duplicate(e)) => {
            tracing::warn!(lawyer_id, ?customer_id, error = %e, "Stripe customer already linked to another lawyer");
            Err(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(%e, "Failed to record Stripe linkage");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// customer.subscription.updated → map price + status to a tier
async fn handle_subscription_updated(state: &AppState, event: &Value) -> StatusCode {
    let Some(obj) = event_object(event) else {
        return StatusCode::OK;
    };
    let lawyer = match find_subscription_owner(state, obj).await {
        Ok(Some(l)) => l,
        Ok(None) => {
            tracing::warn!(subscription_id = ?obj["id"].as_str(), "No lawyer for subscription");
            return StatusCode::OK;
        }
        Err(status) => return status,
    };

    let status = obj["status"].as_str().unwrap_or("");
    if let Err(e) =
        db::lawyers::link_stripe(&state.pool, lawyer.id, None, obj["id"].as_str(), Some(status)).await
    {
        tracing::error!(%e, "Failed to update subscription status");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    // Paid-through time, top-level on older API versions, per item on newer ones
    let period_end = obj["current_period_end"]
        .as_i64()
        .or_else(|| first_item(obj).and_then(|i| i["current_period_end"].as_i64()));
    if let (Some(end), Some(sub_id)) = (period_end, obj["id"].as_str())
        && let Err(e) = db::lawyers::set_expiry_by_subscription(&state.pool, sub_id, end * 1000).await
    {
        tracing::error!(%e, "Failed to update subscription period");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let price_id = first_item(obj)
        .and_then(|i| i.get("price"))
        .and_then(|p| p["id"].as_str());
    let priced_tier = price_id.and_then(|p| state.prices.tier_for_price(p));

    let target = match priced_tier {
        Some(priced) => tier_for_status(status, priced),
        // Unknown price: only a lapse can be acted on
        None => tier_for_status(status, lawyer.tier()).filter(|t| *t == SubscriptionTier::Free),
    };
    if priced_tier.is_none() {
        tracing::warn!(?price_id, "Subscription price not mapped to a tier");
    }

    match target {
        Some(SubscriptionTier::Free) => {
            let change = StatusChange::tier(SubscriptionTier::Free, Trigger::Downgraded, None);
            apply_tier(state, lawyer.id, change).await
        }
        Some(tier) => {
            let change = StatusChange::tier(tier, Trigger::TierChanged, None).keep_expiry();
            apply_tier(state, lawyer.id, change).await
        }
        None => {
            tracing::info!(lawyer_id = lawyer.id, status, "Subscription status leaves tier unchanged");
            StatusCode::OK
        }
    }
}

/// customer.subscription.deleted → downgrade to free
async fn handle_subscription_deleted(state: &AppState, event: &Value) -> StatusCode {
    let Some(obj) = event_object(event) else {
        return StatusCode::OK;
    };
    let lawyer = match find_subscription_owner(state, obj).await {
        Ok(Some(l)) => l,
        Ok(None) => return StatusCode::OK,
        Err(status) => return status,
    };

    if let Err(e) = db::lawyers::link_stripe(&state.pool, lawyer.id, None, None, Some("canceled")).await {
        tracing::error!(%e, "Failed to cancel subscription");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let change = StatusChange::tier(SubscriptionTier::Free, Trigger::Downgraded, None);
    apply_tier(state, lawyer.id, change).await
}

/// invoice.paid → extend subscription_expires_at and restore the paid tier
async fn handle_invoice_paid(state: &AppState, event: &Value) -> StatusCode {
    let Some(obj) = event_object(event) else {
        return StatusCode::OK;
    };
    let Some(sub_id) = obj["subscription"].as_str() else {
        return StatusCode::OK;
    };
    let line = obj
        .get("lines")
        .and_then(|l| l.get("data"))
        .and_then(|d| d.as_array())
        .and_then(|a| a.first());

    if let Some(period_end) = line
        .and_then(|line| line.get("period"))
        .and_then(|p| p["end"].as_i64())
    {
        // Stripe uses seconds
        match db::lawyers::set_expiry_by_subscription(&state.pool, sub_id, period_end * 1000).await {
            Ok(true) => tracing::info!(subscription_id = sub_id, "Invoice paid, period updated"),
            Ok(false) => {
                tracing::warn!(subscription_id = sub_id, "Invoice paid for unknown subscription");
                return StatusCode::OK;
            }
            Err(e) => {
                tracing::error!(%e, "Failed to update subscription period");
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    // A sweep may have downgraded the lawyer before this payment landed
    let Some(paid_tier) = line
        .and_then(|line| line.get("price"))
        .and_then(|p| p["id"].as_str())
        .and_then(|price| state.prices.tier_for_price(price))
    else {
        return StatusCode::OK;
    };
    let lawyer = match db::lawyers::find_by_stripe_subscription(&state.pool, sub_id).await {
        Ok(Some(l)) => l,
        Ok(None) => return StatusCode::OK,
        Err(e) => {
            tracing::error!(%e, "DB error finding lawyer by subscription");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    if lawyer.tier() == paid_tier || lawyer.subscription_status.as_deref() == Some("canceled") {
        return StatusCode::OK;
    }

    let change = StatusChange::tier(paid_tier, Trigger::TierChanged, None).keep_expiry();
    apply_tier(state, lawyer.id, change).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use crate::plans::PlanCatalog;
    use crate::stripe::PriceTierMap;

    #[tokio::test]
    async fn test_customer_linked_elsewhere_is_acknowledged() {
        let pool = test_support::pool().await;
        let first = test_support::insert_lawyer(&pool, "a@example.com", true, "premium").await;
        let second = test_support::insert_lawyer(&pool, "b@example.com", true, "free").await;
        db::lawyers::link_stripe(&pool, first, Some("cus_1"), Some("sub_1"), Some("active"))
            .await
            .unwrap();
        let state = AppState::with_parts(
            pool,
            PlanCatalog::default(),
            PriceTierMap::default(),
            "jwt".into(),
            "whsec".into(),
        );

        let result = link_checkout(&state, second, Some("cus_1"), Some("sub_2")).await;
        assert_eq!(result, Err(StatusCode::OK));

        let untouched = db::lawyers::find_by_id(&state.pool, second).await.unwrap().unwrap();
        assert_eq!(untouched.stripe_customer_id, None);

        assert_eq!(link_checkout(&state, second, Some("cus_2"), Some("sub_2")).await, Ok(()));
    }
}
