//! Data models
//!
//! Shared between the access service and the marketplace frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod actor;
pub mod lawyer;
pub mod permission;
pub mod plan;
pub mod role;

// Re-exports
pub use actor::*;
pub use lawyer::*;
pub use permission::{ALL, MANAGE, Permission, is_valid_segment};
pub use plan::*;
pub use role::*;
