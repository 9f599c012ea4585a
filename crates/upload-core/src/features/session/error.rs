use thiserror::Error;

/// Error kinds enumerated in spec §7, scoped to the session feature.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authorization error: {0}")]
    Authorization(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("illegal state for this operation: {0}")]
    State(String),

    #[error("chunk out of order: {0}")]
    Ordering(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("session expired: {0}")]
    Expired(String),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

pub type PortResult<T> = Result<T, SessionError>;
