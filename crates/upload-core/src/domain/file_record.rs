// crates/upload-core/src/domain/file_record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{FileId, OwnerId, StorageStrategy};

/// Created once at successful finalization (spec §3). Outlives the session
/// it was produced from; has no back-pointer to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub owner_id: OwnerId,
    pub display_name: String,
    pub logical_path: String,
    pub remote_repository: String,
    /// e.g. the manifest path for `repo-chunks`, or `release:<id>:<id>` for
    /// `release-asset` (spec §4.6).
    pub remote_blob_ref: String,
    pub strategy: StorageStrategy,
    /// Opaque structured document: chunk directory + manifest path for
    /// `repo-chunks`, release/asset ids for `release-asset`, etc.
    pub strategy_metadata: Value,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}
