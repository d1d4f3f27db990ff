//! Stripe webhook handling end to end: signature, idempotency, tier changes.
mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{PREMIUM_PRICE, PROFESSIONAL_PRICE, TestApp, WEBHOOK_SECRET};
use legalcity_server::db;
use legalcity_server::services::subscription;
use legalcity_server::stripe::compute_signature;
use serde_json::{Value, json};
use shared::error::ErrorCode;
use shared::models::{Lawyer, SubscriptionTier, role_names};

fn signed(event: &Value) -> Request<Body> {
    let payload = event.to_string();
    let ts = chrono::Utc::now().timestamp();
    let sig = compute_signature(payload.as_bytes(), ts, WEBHOOK_SECRET).unwrap();
    Request::builder()
        .method("POST")
        .uri("/stripe/webhook")
        .header("stripe-signature", format!("t={ts},v1={sig}"))
        .body(Body::from(payload))
        .unwrap()
}

async fn stored(app: &TestApp, id: i64) -> Lawyer {
    db::lawyers::find_by_id(&app.state.pool, id)
        .await
        .unwrap()
        .unwrap()
}

async fn role_of(app: &TestApp, id: i64) -> String {
    db::user_roles::role_for_actor(&app.state.pool, shared::models::ActorRef::lawyer(id))
        .await
        .unwrap()
        .unwrap()
        .name
}

fn checkout(event_id: &str, lawyer_id: i64, tier: &str) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {"object": {
            "customer": "cus_1",
            "subscription": "sub_1",
            "metadata": {"lawyer_id": lawyer_id.to_string(), "tier": tier}
        }}
    })
}

fn subscription_updated(event_id: &str, status: &str, price: &str) -> Value {
    json!({
        "id": event_id,
        "type": "customer.subscription.updated",
        "data": {"object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": status,
            "items": {"data": [{
                "price": {"id": price},
                "current_period_end": 1_900_000_000
            }]}
        }}
    })
}

#[tokio::test]
async fn rejects_unsigned_and_tampered_events() {
    let app = TestApp::new().await;
    let event = json!({"id": "evt_1", "type": "invoice.paid"});

    let unsigned = Request::builder()
        .method("POST")
        .uri("/stripe/webhook")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, body) = app.send(unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::WebhookSignatureInvalid.code());

    let ts = chrono::Utc::now().timestamp();
    let sig = compute_signature(event.to_string().as_bytes(), ts, "whsec_other").unwrap();
    let forged = Request::builder()
        .method("POST")
        .uri("/stripe/webhook")
        .header("stripe-signature", format!("t={ts},v1={sig}"))
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, body) = app.send(forged).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::WebhookSignatureInvalid.code());
}

#[tokio::test]
async fn rejects_signed_event_without_id() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(signed(&json!({"type": "invoice.paid", "data": {"object": {}}})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::WebhookPayloadInvalid.code());
}

#[tokio::test]
async fn checkout_applies_tier_once() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;

    let event = checkout("evt_checkout", lawyer.id, "premium");
    let (status, _) = app.send(signed(&event)).await;
    assert_eq!(status, StatusCode::OK);

    let l = stored(&app, lawyer.id).await;
    assert_eq!(l.tier(), SubscriptionTier::Premium);
    assert_eq!(l.stripe_customer_id.as_deref(), Some("cus_1"));
    assert_eq!(l.stripe_subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(l.subscription_status.as_deref(), Some("active"));
    assert!(l.restrictions().unwrap().payouts);
    assert_eq!(role_of(&app, lawyer.id).await, role_names::PREMIUM_LAWYER);

    // Redelivery is acknowledged without reapplying
    let (status, _) = app.send(signed(&event)).await;
    assert_eq!(status, StatusCode::OK);
    let log = db::audit::query(&app.state.pool, 100, 0).await.unwrap();
    let tier_changes = log.iter().filter(|e| e.action == "tier_changed").count();
    assert_eq!(tier_changes, 1);
}

#[tokio::test]
async fn subscription_status_drives_tier() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "professional")))
        .await;
    assert_eq!(stored(&app, lawyer.id).await.tier(), SubscriptionTier::Professional);

    let (status, _) = app
        .send(signed(&subscription_updated("evt_2", "active", PREMIUM_PRICE)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let l = stored(&app, lawyer.id).await;
    assert_eq!(l.tier(), SubscriptionTier::Premium);
    assert_eq!(l.subscription_expires_at, Some(1_900_000_000_000));

    let (status, _) = app
        .send(signed(&subscription_updated("evt_3", "past_due", PREMIUM_PRICE)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let l = stored(&app, lawyer.id).await;
    assert_eq!(l.tier(), SubscriptionTier::Free);
    assert_eq!(l.subscription_status.as_deref(), Some("past_due"));
    assert_eq!(role_of(&app, lawyer.id).await, role_names::VERIFIED_LAWYER);

    // Incomplete leaves the tier alone
    app.send(signed(&subscription_updated("evt_4", "active", PROFESSIONAL_PRICE)))
        .await;
    app.send(signed(&subscription_updated("evt_5", "incomplete", PREMIUM_PRICE)))
        .await;
    assert_eq!(stored(&app, lawyer.id).await.tier(), SubscriptionTier::Professional);
}

#[tokio::test]
async fn unmapped_price_does_not_upgrade() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "professional")))
        .await;

    app.send(signed(&subscription_updated("evt_2", "active", "price_unknown")))
        .await;
    assert_eq!(stored(&app, lawyer.id).await.tier(), SubscriptionTier::Professional);

    app.send(signed(&subscription_updated("evt_3", "unpaid", "price_unknown")))
        .await;
    assert_eq!(stored(&app, lawyer.id).await.tier(), SubscriptionTier::Free);
}

#[tokio::test]
async fn deleted_subscription_downgrades() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "premium"))).await;

    let event = json!({
        "id": "evt_2",
        "type": "customer.subscription.deleted",
        "data": {"object": {"id": "sub_1", "customer": "cus_1", "status": "canceled"}}
    });
    let (status, _) = app.send(signed(&event)).await;
    assert_eq!(status, StatusCode::OK);

    let l = stored(&app, lawyer.id).await;
    assert_eq!(l.tier(), SubscriptionTier::Free);
    assert_eq!(l.subscription_status.as_deref(), Some("canceled"));
    assert!(!l.restrictions().unwrap().payouts);
    assert_eq!(role_of(&app, lawyer.id).await, role_names::VERIFIED_LAWYER);

    let log = db::audit::query(&app.state.pool, 100, 0).await.unwrap();
    assert!(log.iter().any(|e| e.action == "subscription_downgraded"));
}

#[tokio::test]
async fn invoice_paid_extends_expiry_and_sweep_expires() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "premium"))).await;

    let event = json!({
        "id": "evt_2",
        "type": "invoice.paid",
        "data": {"object": {
            "subscription": "sub_1",
            "lines": {"data": [{"period": {"start": 1_700_000_000, "end": 1_800_000_000}}]}
        }}
    });
    let (status, _) = app.send(signed(&event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stored(&app, lawyer.id).await.subscription_expires_at,
        Some(1_800_000_000_000)
    );

    // Not lapsed yet
    let expired = subscription::expire_lapsed(&app.state.pool, &app.state.plans, 1_799_999_999_999)
        .await
        .unwrap();
    assert!(expired.is_empty());

    let expired = subscription::expire_lapsed(&app.state.pool, &app.state.plans, 1_800_000_000_001)
        .await
        .unwrap();
    assert_eq!(expired, vec![lawyer.id]);
    assert_eq!(stored(&app, lawyer.id).await.tier(), SubscriptionTier::Free);
    assert_eq!(role_of(&app, lawyer.id).await, role_names::VERIFIED_LAWYER);
}

#[tokio::test]
async fn unhandled_and_orphan_events_are_acknowledged() {
    let app = TestApp::new().await;

    let event = json!({"id": "evt_1", "type": "customer.created", "data": {"object": {}}});
    let (status, _) = app.send(signed(&event)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(signed(&subscription_updated("evt_2", "active", PREMIUM_PRICE)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(signed(&checkout("evt_3", 999, "premium"))).await;
    assert_eq!(status, StatusCode::OK);
}

fn invoice_paid(event_id: &str, period_end: i64, price: &str) -> Value {
    json!({
        "id": event_id,
        "type": "invoice.paid",
        "data": {"object": {
            "subscription": "sub_1",
            "lines": {"data": [{
                "period": {"start": period_end - 1000, "end": period_end},
                "price": {"id": price}
            }]}
        }}
    })
}

#[tokio::test]
async fn invoice_paid_after_sweep_restores_tier() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "premium"))).await;
    app.send(signed(&invoice_paid("evt_2", 1_800_000_000, PREMIUM_PRICE)))
        .await;

    // The renewal is late and the sweep gets there first
    let expired = subscription::expire_lapsed(&app.state.pool, &app.state.plans, 1_800_000_000_001)
        .await
        .unwrap();
    assert_eq!(expired, vec![lawyer.id]);
    let swept = stored(&app, lawyer.id).await;
    assert_eq!(swept.tier(), SubscriptionTier::Free);
    assert_eq!(swept.subscription_expires_at, None);

    let (status, _) = app
        .send(signed(&invoice_paid("evt_3", 1_900_000_000, PREMIUM_PRICE)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let restored = stored(&app, lawyer.id).await;
    assert_eq!(restored.tier(), SubscriptionTier::Premium);
    assert_eq!(restored.subscription_expires_at, Some(1_900_000_000_000));
    assert_eq!(role_of(&app, lawyer.id).await, role_names::PREMIUM_LAWYER);

    // Still paid through, so the next sweep leaves it alone
    let expired = subscription::expire_lapsed(&app.state.pool, &app.state.plans, 1_850_000_000_000)
        .await
        .unwrap();
    assert!(expired.is_empty());
}

#[tokio::test]
async fn checkout_clears_a_stale_expiry() {
    let app = TestApp::new().await;
    let lawyer = app.lawyer("ana@example.com", true, SubscriptionTier::Free).await;
    app.send(signed(&checkout("evt_1", lawyer.id, "premium"))).await;
    app.send(signed(&invoice_paid("evt_2", 1_000, PREMIUM_PRICE))).await;
    assert_eq!(stored(&app, lawyer.id).await.subscription_expires_at, Some(1_000_000));

    app.send(signed(&checkout("evt_3", lawyer.id, "professional")))
        .await;
    let l = stored(&app, lawyer.id).await;
    assert_eq!(l.tier(), SubscriptionTier::Professional);
    assert_eq!(l.subscription_expires_at, None);

    let expired = subscription::expire_lapsed(&app.state.pool, &app.state.plans, 2_000_000)
        .await
        .unwrap();
    assert!(expired.is_empty());
}
