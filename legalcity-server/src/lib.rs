//! legalcity-server: access service for the LegalCity marketplace
//!
//! Owns the role-based permission store, the subscription-tier plan
//! restrictions and the middleware that gates lawyer features on both.
//!
//! - Role assignment from verification + tier (`services::role_assignment`)
//! - Permission checks against the RBAC tables (`auth::permission`)
//! - Feature-flag checks against per-lawyer plan restrictions (`auth::feature`)
//! - Stripe subscription events that drive tier changes (`api::stripe_webhook`)

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod plans;
pub mod services;
pub mod state;
pub mod stripe;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use plans::PlanCatalog;
pub use state::AppState;

/// Boxed error for startup and infrastructure paths
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Security audit logging macro
///
/// Emits to the `security` target so operators can route it separately.
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
