//! Plan restriction templates
//!
//! [`PlanCatalog`] maps each [`SubscriptionTier`] to the [`PlanRestrictions`]
//! a lawyer on that tier receives. It is built once at startup (built-in
//! defaults or a JSON override file) and shared read-only through `AppState`.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Feature, PlanRestrictions, SubscriptionTier};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Plan catalog loading errors
#[derive(Debug, Error)]
pub enum PlanCatalogError {
    #[error("failed to read plan templates {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid plan templates {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<PlanCatalogError> for AppError {
    fn from(e: PlanCatalogError) -> Self {
        let path = match &e {
            PlanCatalogError::Io { path, .. } | PlanCatalogError::Parse { path, .. } => {
                path.display().to_string()
            }
        };
        AppError::with_message(ErrorCode::PlanTemplateInvalid, e.to_string()).with_detail("path", path)
    }
}

/// Tier → restrictions templates
///
/// Every tier must be present; unknown tiers or feature keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanCatalog {
    free: PlanRestrictions,
    professional: PlanRestrictions,
    premium: PlanRestrictions,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            free: PlanRestrictions::with_features(&[Feature::Forms]),
            professional: PlanRestrictions::with_features(&[
                Feature::Messages,
                Feature::Documents,
                Feature::Forms,
                Feature::Blogs,
                Feature::CaseTracking,
            ]),
            premium: PlanRestrictions::with_features(&Feature::ALL),
        }
    }
}

impl PlanCatalog {
    /// Built-in templates, or the override file when a path is given
    pub fn load(path: Option<&Path>) -> Result<Self, PlanCatalogError> {
        match path {
            Some(path) => {
                let catalog = Self::from_file(path)?;
                tracing::info!(path = %path.display(), "Loaded plan templates");
                Ok(catalog)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PlanCatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| PlanCatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| PlanCatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy of the template for `tier`
    pub fn template(&self, tier: SubscriptionTier) -> PlanRestrictions {
        match tier {
            SubscriptionTier::Free => self.free,
            SubscriptionTier::Professional => self.professional,
            SubscriptionTier::Premium => self.premium,
        }
    }
}
