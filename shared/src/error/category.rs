//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Subscription errors
/// - 4xxx: Account errors
/// - 5xxx: Payment errors
/// - 8xxx: Role errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx, plus unassigned 6xxx/7xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Subscription errors (3xxx)
    Subscription,
    /// Account errors (4xxx)
    Account,
    /// Payment errors (5xxx)
    Payment,
    /// Role errors (8xxx)
    Role,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Subscription,
            4000..5000 => Self::Account,
            5000..6000 => Self::Payment,
            8000..9000 => Self::Role,
            9000.. => Self::System,
            _ => Self::General,
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
