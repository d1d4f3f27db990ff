//! Authentication and authorization middleware

pub mod actor_auth;
pub mod feature;
pub mod permission;

pub use actor_auth::{ActorIdentity, actor_auth_middleware, create_token};
pub use feature::{require_feature, restrictions_allow};
pub use permission::require_permission;
