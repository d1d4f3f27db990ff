//! RBAC permission middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::Permission;
use std::future::Future;
use std::pin::Pin;

use super::ActorIdentity;
use crate::security_log;
use crate::services::authorization;
use crate::state::AppState;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Permission check middleware: the caller's role must grant
/// `action:resource` (or `manage:all`).
///
/// Must run after `actor_auth_middleware`.
///
/// ```ignore
/// Router::new()
///     .route("/api/admin/roles", get(admin::list_roles))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         require_permission("read", "roles"),
///     ));
/// ```
pub fn require_permission(
    action: &'static str,
    resource: &'static str,
) -> impl Fn(State<AppState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AppState>, req: Request, next: Next| {
        Box::pin(async move {
            let identity = req
                .extensions()
                .get::<ActorIdentity>()
                .copied()
                .ok_or_else(AppError::not_authenticated)?;

            let permissions = authorization::resolve(&state.pool, identity.actor())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Permission lookup failed");
                    AppError::internal("Permission lookup failed")
                })?;

            if !permissions.allows(action, resource) {
                let required = Permission::derive_name(action, resource);
                security_log!(
                    "WARN",
                    "permission_denied",
                    actor_id = identity.actor_id,
                    actor_type = identity.actor_type.as_db(),
                    required_permission = required.as_str()
                );
                return Err(AppError::permission_denied(format!(
                    "Permission denied: {required}"
                ))
                .with_detail("permission", required));
            }

            Ok(next.run(req).await)
        })
    }
}
