//! Role Model

use serde::{Deserialize, Serialize};

/// Seeded role names. Rows are created by migration; the assignment service
/// resolves them by name and fails if one is missing.
pub mod role_names {
    pub const ADMIN: &str = "admin";
    pub const PREMIUM_LAWYER: &str = "premium_lawyer";
    pub const VERIFIED_LAWYER: &str = "verified_lawyer";
    pub const LAWYER: &str = "lawyer";
    pub const USER: &str = "user";
}

/// Role entity (RBAC role)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Integer rank, higher is more privileged. Informational only: no
    /// permission is inherited from lower-ranked roles.
    pub level: i64,
}

/// Role with its explicitly granted permission names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
}

/// Assignment of one role to one actor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserRole {
    pub id: i64,
    pub user_id: i64,
    pub user_type: String,
    pub role_id: i64,
    pub created_at: i64,
}
