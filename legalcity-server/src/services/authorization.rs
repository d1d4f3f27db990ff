//! Permission resolution
//!
//! A [`PermissionSet`] is the flat set of (action, resource) pairs reachable
//! from an actor's role. Matching is exact; the only wildcard is
//! `manage:all`. No other action implies another.

use shared::models::{ALL, ActorRef, MANAGE, Permission};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

use crate::db::{self, RepoResult};

/// Resolved permissions for one actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pairs: BTreeSet<(String, String)>,
}

impl PermissionSet {
    pub fn from_permissions(perms: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            pairs: perms.into_iter().map(|p| (p.action, p.resource)).collect(),
        }
    }

    pub fn is_manage_all(&self) -> bool {
        self.pairs.contains(&(MANAGE.to_string(), ALL.to_string()))
    }

    /// Exact pair match, or the `manage:all` wildcard
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.is_manage_all() || self.pairs.contains(&(action.to_string(), resource.to_string()))
    }

    /// Permission names, sorted
    pub fn names(&self) -> Vec<String> {
        self.pairs
            .iter()
            .map(|(a, r)| Permission::derive_name(a, r))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Load the actor's permission set from the RBAC tables
pub async fn resolve(pool: &SqlitePool, actor: ActorRef) -> RepoResult<PermissionSet> {
    let perms = db::permissions::for_actor(pool, actor).await?;
    Ok(PermissionSet::from_permissions(perms))
}
