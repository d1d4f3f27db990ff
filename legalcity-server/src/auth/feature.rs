//! Plan feature-flag middleware
//!
//! Independent of the RBAC check: a route may stack both and a request must
//! pass both. Every failure path denies.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::{ActorType, Feature, PlanRestrictions};
use std::future::Future;
use std::pin::Pin;

use super::ActorIdentity;
use crate::db;
use crate::security_log;
use crate::state::AppState;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Does the stored restrictions blob enable `feature_key`?
///
/// Unknown keys and malformed blobs deny.
pub fn restrictions_allow(blob: &str, feature_key: &str) -> bool {
    let Ok(feature) = feature_key.parse::<Feature>() else {
        return false;
    };
    match PlanRestrictions::from_blob(blob) {
        Ok(restrictions) => restrictions.allows(feature),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed plan restrictions, denying");
            false
        }
    }
}

/// Feature gate for lawyer routes. Non-lawyer actors are denied.
///
/// Must run after `actor_auth_middleware`.
pub fn require_feature(
    feature: Feature,
) -> impl Fn(State<AppState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AppState>, req: Request, next: Next| {
        Box::pin(async move {
            let identity = req
                .extensions()
                .get::<ActorIdentity>()
                .copied()
                .ok_or_else(AppError::not_authenticated)?;

            let allowed = match identity.actor_type {
                ActorType::Lawyer => {
                    let blob = db::lawyers::restrictions_blob(&state.pool, identity.actor_id)
                        .await
                        .map_err(|e| {
                            tracing::error!(error = %e, "Plan restrictions lookup failed");
                            AppError::internal("Plan restrictions lookup failed")
                        })?;
                    blob.flatten()
                        .is_some_and(|blob| restrictions_allow(&blob, feature.key()))
                }
                _ => false,
            };

            if !allowed {
                security_log!(
                    "WARN",
                    "feature_denied",
                    actor_id = identity.actor_id,
                    actor_type = identity.actor_type.as_db(),
                    feature = feature.key()
                );
                return Err(AppError::feature_not_available(feature.key()));
            }

            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::PlanCatalog;
    use shared::models::SubscriptionTier;

    #[test]
    fn test_matches_catalog_templates() {
        let catalog = PlanCatalog::default();
        for tier in SubscriptionTier::ALL {
            let template = catalog.template(tier);
            let blob = template.to_blob().unwrap();
            for feature in Feature::ALL {
                assert_eq!(
                    restrictions_allow(&blob, feature.key()),
                    template.allows(feature),
                    "{tier} / {feature}"
                );
            }
        }
    }

    #[test]
    fn test_absent_key_denies() {
        assert!(!restrictions_allow(r#"{"forms":true}"#, "payouts"));
        assert!(restrictions_allow(r#"{"forms":true}"#, "forms"));
    }

    #[test]
    fn test_unknown_feature_denies() {
        let blob = PlanRestrictions::with_features(&Feature::ALL).to_blob().unwrap();
        assert!(!restrictions_allow(&blob, "teleport"));
    }

    #[test]
    fn test_malformed_blob_denies() {
        assert!(!restrictions_allow("{not json", "forms"));
        assert!(!restrictions_allow(r#"{"forms":"yes"}"#, "forms"));
        assert!(!restrictions_allow(r#"["forms"]"#, "forms"));
    }
}
