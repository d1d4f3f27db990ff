//! Shared helpers for router-level tests
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use legalcity_server::auth::create_token;
use legalcity_server::db::DbService;
use legalcity_server::services::role_assignment::{self, StatusChange, Trigger};
use legalcity_server::stripe::PriceTierMap;
use legalcity_server::{AppState, PlanCatalog, api};
use serde_json::Value;
use shared::models::{ActorRef, ActorType, SubscriptionTier};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const PROFESSIONAL_PRICE: &str = "price_professional";
pub const PREMIUM_PRICE: &str = "price_premium";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbService::in_memory().await.expect("database");
        let state = AppState::with_parts(
            db.pool,
            PlanCatalog::default(),
            PriceTierMap::new(Some(PROFESSIONAL_PRICE), Some(PREMIUM_PRICE)),
            JWT_SECRET.to_string(),
            WEBHOOK_SECRET.to_string(),
        );
        let router = api::create_router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, actor: Option<ActorRef>) -> (StatusCode, Value) {
        self.send(request("GET", uri, actor, None)).await
    }

    pub async fn post(&self, uri: &str, actor: ActorRef, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, Some(actor), Some(body))).await
    }

    /// Register a lawyer and drive it to the given status
    pub async fn lawyer(&self, email: &str, verified: bool, tier: SubscriptionTier) -> ActorRef {
        let created =
            role_assignment::register_lawyer(&self.state.pool, &self.state.plans, email, "Lawyer", None)
                .await
                .expect("register lawyer");
        let id = created.lawyer_id;
        if verified {
            role_assignment::apply_status(&self.state.pool, &self.state.plans, id, StatusChange::verify(None))
                .await
                .expect("verify");
        }
        if tier != SubscriptionTier::Free {
            role_assignment::apply_status(
                &self.state.pool,
                &self.state.plans,
                id,
                StatusChange::tier(tier, Trigger::TierChanged, None),
            )
            .await
            .expect("tier");
        }
        ActorRef::lawyer(id)
    }

    pub async fn admin(&self) -> ActorRef {
        let admin = ActorRef::new(1, ActorType::Admin);
        role_assignment::assign_fixed_role(&self.state.pool, admin)
            .await
            .expect("admin role");
        admin
    }
}

pub fn bearer(actor: ActorRef) -> String {
    format!("Bearer {}", create_token(actor, JWT_SECRET).expect("token"))
}

pub fn request(method: &str, uri: &str, actor: Option<ActorRef>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("authorization", bearer(actor));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
