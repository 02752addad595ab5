use thiserror::Error;

/// Errors raised by the reconciliation core. All are synchronous and scoped
/// to a single evaluation or transition; the API layer translates them into
/// HTTP responses.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("export error: {0}")]
    Export(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
