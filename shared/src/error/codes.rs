//! Unified error codes for LegalCity services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Subscription / plan errors
//! - 4xxx: Account errors (lawyers, clients)
//! - 5xxx: Payment provider errors
//! - 8xxx: Role errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Subscription ====================
    /// Feature not available in current subscription plan
    FeatureNotAvailable = 3001,
    /// Unknown subscription tier
    UnknownTier = 3002,
    /// Plan template configuration is invalid
    PlanTemplateInvalid = 3003,

    // ==================== 4xxx: Account ====================
    /// Lawyer not found
    LawyerNotFound = 4001,
    /// Lawyer email already registered
    LawyerEmailExists = 4002,

    // ==================== 5xxx: Payment ====================
    /// Webhook signature verification failed
    WebhookSignatureInvalid = 5001,
    /// Webhook payload could not be parsed
    WebhookPayloadInvalid = 5002,

    // ==================== 8xxx: Role ====================
    /// Role not found
    RoleNotFound = 8101,
    /// Permission action/resource is malformed
    PermissionInvalid = 8201,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Subscription
            ErrorCode::FeatureNotAvailable => "Feature not available in current subscription plan",
            ErrorCode::UnknownTier => "Unknown subscription tier",
            ErrorCode::PlanTemplateInvalid => "Plan template configuration is invalid",

            // Account
            ErrorCode::LawyerNotFound => "Lawyer not found",
            ErrorCode::LawyerEmailExists => "Lawyer email already registered",

            // Payment
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",
            ErrorCode::WebhookPayloadInvalid => "Webhook payload is invalid",

            // Role
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::PermissionInvalid => "Permission action or resource is invalid",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Subscription
            3001 => Ok(ErrorCode::FeatureNotAvailable),
            3002 => Ok(ErrorCode::UnknownTier),
            3003 => Ok(ErrorCode::PlanTemplateInvalid),

            // Account
            4001 => Ok(ErrorCode::LawyerNotFound),
            4002 => Ok(ErrorCode::LawyerEmailExists),

            // Payment
            5001 => Ok(ErrorCode::WebhookSignatureInvalid),
            5002 => Ok(ErrorCode::WebhookPayloadInvalid),

            // Role
            8101 => Ok(ErrorCode::RoleNotFound),
            8201 => Ok(ErrorCode::PermissionInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
