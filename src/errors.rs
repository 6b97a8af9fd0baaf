use sea_orm::error::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the data-access services.
///
/// Every write operation reports failures synchronously through this type;
/// transactional operations roll back fully before returning an error.
#[derive(Error, Debug, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing field, enum value out of range, uniqueness
    /// violation, or a required reference to a nonexistent record.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A protect-policy delete was attempted while dependent rows exist.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Event error: {0}")]
    EventError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}
