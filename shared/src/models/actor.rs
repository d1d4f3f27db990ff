//! Actor Model
//!
//! Every authenticated caller is an actor, identified by `(id, type)`.
//! Clients and lawyers live in separate tables, so an id alone is ambiguous.

use serde::{Deserialize, Serialize};

/// Actor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// Marketplace client
    User,
    /// Listed lawyer
    Lawyer,
    /// Back-office administrator
    Admin,
}

impl ActorType {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "lawyer" => Some(Self::Lawyer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Lawyer => "lawyer",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Reference to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: i64,
    pub actor_type: ActorType,
}

impl ActorRef {
    pub fn new(id: i64, actor_type: ActorType) -> Self {
        Self { id, actor_type }
    }

    pub fn lawyer(id: i64) -> Self {
        Self::new(id, ActorType::Lawyer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_roundtrip() {
        for t in [ActorType::User, ActorType::Lawyer, ActorType::Admin] {
            assert_eq!(ActorType::from_db(t.as_db()), Some(t));
        }
        assert_eq!(ActorType::from_db("client"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActorType::Lawyer).unwrap(),
            "\"lawyer\""
        );
        let t: ActorType = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(t, ActorType::Admin);
    }
}
