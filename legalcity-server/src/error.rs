//! Unified service-layer error type for the access service
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `RepoError`, `BoxError`)
//! and the API-layer error (`AppError`), so handlers can propagate with `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::BoxError;
use crate::db::RepoError;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => ServiceError::App(AppError::with_message(ErrorCode::NotFound, msg)),
            RepoError::Duplicate(msg) => {
                ServiceError::App(AppError::with_message(ErrorCode::AlreadyExists, msg))
            }
            RepoError::Validation(msg) => ServiceError::App(AppError::validation(msg)),
            RepoError::Database(msg) => ServiceError::Db(msg.into()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_mapping() {
        let app: AppError = ServiceError::from(RepoError::Duplicate("email".into())).into();
        assert_eq!(app.code, ErrorCode::AlreadyExists);

        let app: AppError = ServiceError::from(RepoError::Validation("bad".into())).into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);

        let app: AppError = ServiceError::from(RepoError::Database("locked".into())).into();
        assert_eq!(app.code, ErrorCode::InternalError);
        assert_eq!(app.message, ErrorCode::InternalError.message());
    }

    #[test]
    fn test_app_error_passthrough() {
        let app: AppError =
            ServiceError::from(AppError::permission_denied("read:payouts")).into();
        assert_eq!(app.code, ErrorCode::PermissionDenied);
        assert_eq!(app.message, "read:payouts");
    }
}
