// crates/upload-core/src/domain/chunk.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::SessionId;

/// One successfully staged chunk, uniquely keyed `(session_id, chunk_index)`
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub session_id: SessionId,
    pub chunk_index: u32,
    pub size_bytes: u64,
    pub client_digest: Option<String>,
    pub server_digest: String,
    pub scratch_path: String,
    pub received_at: DateTime<Utc>,
}
