//! Shared types for LegalCity services
//!
//! Common types used across crates: the unified error system, the access
//! control models and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
