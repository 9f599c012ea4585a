// crates/upload-core/src/domain/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{OwnerId, SessionId, SessionStatus, StorageStrategy};

/// One upload from `init` through a terminal state (spec §3).
///
/// Fields above the `--- mutable ---` marker are immutable after `init`;
/// fields below it are the only ones a running session may update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: SessionId,
    pub owner_id: OwnerId,

    // --- immutable after init ---
    pub file_name: String,
    pub declared_size: u64,
    pub mime_hint: Option<String>,
    pub target_path: String,
    pub chunk_size: u64,
    pub total_chunks: u32,
    pub strategy: StorageStrategy,
    pub target_repository: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    // --- mutable ---
    pub status: SessionStatus,
    pub received_chunks: u32,
    pub received_bytes: u64,
    pub error_message: Option<String>,
    pub manifest_path: Option<String>,
    pub final_blob_path: Option<String>,
    pub final_file_id: Option<shared::FileId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UploadSession {
    /// `received_chunks ≤ total_chunks` and `received_bytes ≤ declared_size`
    /// (spec §3 invariants). Checked defensively wherever a session is
    /// loaded from the metadata store, since a corrupt row should fail
    /// loudly rather than silently misbehave.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.received_chunks > self.total_chunks {
            return Err(format!(
                "received_chunks ({}) exceeds total_chunks ({})",
                self.received_chunks, self.total_chunks
            ));
        }
        if self.received_bytes > self.declared_size {
            return Err(format!(
                "received_bytes ({}) exceeds declared_size ({})",
                self.received_bytes, self.declared_size
            ));
        }
        if self.status.is_terminal() && self.status != SessionStatus::Completed {
            // aborted/failed sessions may legitimately have received_chunks
            // short of total_chunks; nothing further to check here.
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && now >= self.expires_at
    }

    pub fn is_complete(&self) -> bool {
        self.received_chunks == self.total_chunks
    }

    /// The unique next-expected chunk index (spec §4.2 resumption contract).
    pub fn next_expected_chunk(&self) -> u32 {
        self.received_chunks
    }
}

/// Chunk size is clamped to `[1 MiB, 50 MiB]` and never larger than the
/// declared size itself (spec §4.5).
pub const MIN_CHUNK_SIZE: u64 = 1 * 1024 * 1024;
pub const MAX_CHUNK_SIZE: u64 = 50 * 1024 * 1024;

pub fn total_chunks_for(declared_size: u64, chunk_size: u64) -> u32 {
    if declared_size == 0 {
        return 0;
    }
    ((declared_size + chunk_size - 1) / chunk_size) as u32
}
