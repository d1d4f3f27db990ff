//! Subscription plan models
//!
//! [`PlanRestrictions`] is the per-lawyer feature-flag record derived from the
//! lawyer's [`SubscriptionTier`]. It is persisted as a JSON object and always
//! rebuilt wholesale from the tier template.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Professional,
    Premium,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Professional, Self::Premium];

    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "professional" => Some(Self::Professional),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Professional => "professional",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Named plan feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Messages,
    Documents,
    Forms,
    Payouts,
    Blogs,
    Analytics,
    PriorityListing,
    CaseTracking,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Self::Messages,
        Self::Documents,
        Self::Forms,
        Self::Payouts,
        Self::Blogs,
        Self::Analytics,
        Self::PriorityListing,
        Self::CaseTracking,
    ];

    /// Key used in the persisted JSON object
    pub fn key(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Documents => "documents",
            Self::Forms => "forms",
            Self::Payouts => "payouts",
            Self::Blogs => "blogs",
            Self::Analytics => "analytics",
            Self::PriorityListing => "priority_listing",
            Self::CaseTracking => "case_tracking",
        }
    }
}

/// Unknown feature key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Feature flags granted by a plan
///
/// Missing keys deserialize as `false`; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanRestrictions {
    pub messages: bool,
    pub documents: bool,
    pub forms: bool,
    pub payouts: bool,
    pub blogs: bool,
    pub analytics: bool,
    pub priority_listing: bool,
    pub case_tracking: bool,
}

impl PlanRestrictions {
    /// Restrictions with every listed feature enabled
    pub fn with_features(features: &[Feature]) -> Self {
        let mut r = Self::default();
        for f in features {
            r.set(*f, true);
        }
        r
    }

    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::Messages => self.messages,
            Feature::Documents => self.documents,
            Feature::Forms => self.forms,
            Feature::Payouts => self.payouts,
            Feature::Blogs => self.blogs,
            Feature::Analytics => self.analytics,
            Feature::PriorityListing => self.priority_listing,
            Feature::CaseTracking => self.case_tracking,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::Messages => &mut self.messages,
            Feature::Documents => &mut self.documents,
            Feature::Forms => &mut self.forms,
            Feature::Payouts => &mut self.payouts,
            Feature::Blogs => &mut self.blogs,
            Feature::Analytics => &mut self.analytics,
            Feature::PriorityListing => &mut self.priority_listing,
            Feature::CaseTracking => &mut self.case_tracking,
        };
        *slot = enabled;
    }

    pub fn enabled_features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.allows(*f))
            .collect()
    }

    /// Parse a persisted restrictions blob
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    /// Serialize for persistence
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_db_roundtrip() {
        for tier in SubscriptionTier::ALL {
            assert_eq!(SubscriptionTier::from_db(tier.as_db()), Some(tier));
        }
        assert_eq!(SubscriptionTier::from_db("gold"), None);
    }

    #[test]
    fn test_feature_from_str() {
        for f in Feature::ALL {
            assert_eq!(f.key().parse::<Feature>(), Ok(f));
        }
        assert_eq!(
            "teleport".parse::<Feature>(),
            Err(UnknownFeature("teleport".into()))
        );
    }

    #[test]
    fn test_feature_serde_matches_key() {
        for f in Feature::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.key()));
        }
    }

    #[test]
    fn test_with_features_and_allows() {
        let r = PlanRestrictions::with_features(&[Feature::Forms, Feature::Payouts]);
        assert!(r.allows(Feature::Forms));
        assert!(r.allows(Feature::Payouts));
        assert!(!r.allows(Feature::Messages));
        assert_eq!(r.enabled_features(), vec![Feature::Forms, Feature::Payouts]);
    }

    #[test]
    fn test_blob_missing_key_is_false() {
        let r = PlanRestrictions::from_blob(r#"{"messages":true}"#).unwrap();
        assert!(r.messages);
        assert!(!r.payouts);
    }

    #[test]
    fn test_blob_rejects_unknown_key_and_garbage() {
        assert!(PlanRestrictions::from_blob(r#"{"teleport":true}"#).is_err());
        assert!(PlanRestrictions::from_blob("not json").is_err());
        assert!(PlanRestrictions::from_blob(r#"{"messages":"yes"}"#).is_err());
    }

    #[test]
    fn test_blob_keys_match_feature_keys() {
        let all = PlanRestrictions::with_features(&Feature::ALL);
        let value: serde_json::Value = serde_json::from_str(&all.to_blob().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), Feature::ALL.len());
        for f in Feature::ALL {
            assert_eq!(obj.get(f.key()), Some(&serde_json::Value::Bool(true)));
        }
    }
}
