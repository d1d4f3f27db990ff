//! Permission Model
//!
//! A permission is an (action, resource) pair. Its `name` is always derived
//! as `"{action}:{resource}"`.

use serde::{Deserialize, Serialize};

/// Wildcard action
pub const MANAGE: &str = "manage";
/// Wildcard resource
pub const ALL: &str = "all";

/// Permission entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub action: String,
    pub resource: String,
    pub name: String,
}

impl Permission {
    /// Derived permission name
    pub fn derive_name(action: &str, resource: &str) -> String {
        format!("{action}:{resource}")
    }
}

/// Validate an action or resource segment: non-empty, lowercase ASCII
/// letters and underscores only.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= 64
        && segment.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}
