pub mod health;
pub mod upload;

use axum::http::HeaderMap;
use shared::OwnerId;

use crate::error::AppError;

pub const SERVICE_CREDENTIAL_HEADER: &str = "x-service-credential";
pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const CHUNK_INDEX_HEADER: &str = "x-chunk-index";
pub const CHUNK_CHECKSUM_HEADER: &str = "x-chunk-checksum";

/// Every non-health request must carry a shared service-credential header
/// and an owner-id header; absence yields 401 (spec §4.1/§6).
pub fn authenticate(headers: &HeaderMap, expected_credential: &str) -> Result<OwnerId, AppError> {
    let credential = headers
        .get(SERVICE_CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing service credential".into()))?;
    if credential != expected_credential {
        return Err(AppError::Unauthorized("invalid service credential".into()));
    }

    let owner_id = headers
        .get(OWNER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing owner id".into()))?;

    Ok(OwnerId::from(owner_id))
}
