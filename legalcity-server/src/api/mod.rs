//! API routes for the access service

pub mod access;
pub mod admin;
pub mod extract;
pub mod health;
pub mod lawyer;
pub mod stripe_webhook;

use axum::routing::{MethodRouter, get, post, put};
use axum::{Router, middleware};
use shared::error::AppResult;
use shared::models::Feature;
use tower_http::trace::TraceLayer;

use crate::auth::{actor_auth_middleware, require_feature, require_permission};
use crate::state::AppState;

pub type ApiResult<T> = AppResult<axum::Json<T>>;

/// Gate a route on an RBAC permission
fn permit(
    state: &AppState,
    route: MethodRouter<AppState>,
    action: &'static str,
    resource: &'static str,
) -> MethodRouter<AppState> {
    route.layer(middleware::from_fn_with_state(
        state.clone(),
        require_permission(action, resource),
    ))
}

/// Gate a route on a permission AND a plan feature (permission checked first)
fn permit_with_feature(
    state: &AppState,
    route: MethodRouter<AppState>,
    action: &'static str,
    resource: &'static str,
    feature: Feature,
) -> MethodRouter<AppState> {
    let route = route.layer(middleware::from_fn_with_state(
        state.clone(),
        require_feature(feature),
    ));
    permit(state, route, action, resource)
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let lawyer = Router::new()
        .route(
            "/payouts/eligibility",
            permit_with_feature(
                &state,
                get(lawyer::payout_eligibility),
                "read",
                "payouts",
                Feature::Payouts,
            ),
        )
        .route(
            "/analytics/summary",
            permit_with_feature(
                &state,
                get(lawyer::analytics_summary),
                "read",
                "analytics",
                Feature::Analytics,
            ),
        );

    let admin = Router::new()
        .route(
            "/lawyers",
            permit(&state, post(admin::create_lawyer), "create", "lawyers"),
        )
        .route(
            "/lawyers/{id}/verify",
            permit(&state, post(admin::verify_lawyer), "update", "lawyers"),
        )
        .route(
            "/lawyers/{id}/tier",
            permit(&state, put(admin::change_tier), "update", "subscriptions"),
        )
        .route(
            "/lawyers/{id}/reassign",
            permit(&state, post(admin::reassign), "manage", "roles"),
        )
        .route(
            "/roles",
            permit(&state, get(admin::list_roles), "read", "roles"),
        )
        .route(
            "/roles/{name}/permissions",
            permit(
                &state,
                post(admin::grant_permission).delete(admin::revoke_permission),
                "manage",
                "roles",
            ),
        )
        .route(
            "/audit-log",
            permit(&state, get(admin::audit_log), "read", "audit"),
        );

    // Bearer JWT on everything under /api
    let api = Router::new()
        .route("/me/access", get(access::my_access))
        .route("/access/check", get(access::check))
        .nest("/lawyer", lawyer)
        .nest("/admin", admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            actor_auth_middleware,
        ));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/stripe/webhook", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhook)
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
