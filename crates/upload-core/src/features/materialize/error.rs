// crates/upload-core/src/features/materialize/error.rs

use thiserror::Error;

/// Errors a `RemoteClient` adapter can raise (spec §4.7). Expressed as an
/// enum rather than a single opaque error so the retry loop in `use_case.rs`
/// can classify failures without string matching.
#[derive(Debug, Error, Clone)]
pub enum RemoteError {
    #[error("remote path not found: {0}")]
    NotFound(String),

    #[error("remote rejected request as unprocessable: {0}")]
    Unprocessable(String),

    #[error("remote rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("transient remote failure: {0}")]
    Transient(String),

    #[error("permanent remote failure: {0}")]
    Permanent(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    pub fn is_unprocessable(&self) -> bool {
        matches!(self, RemoteError::Unprocessable(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited { .. })
    }

    /// Transient failures and rate limits are worth retrying; not-found,
    /// unprocessable and permanent failures are not (spec §4.7).
    pub fn is_retriable(&self) -> bool {
        matches!(self, RemoteError::Transient(_) | RemoteError::RateLimited { .. })
    }
}
