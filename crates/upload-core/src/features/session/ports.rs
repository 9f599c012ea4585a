// crates/upload-core/src/features/session/ports.rs

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use shared::{FileId, OwnerId, SessionId, SessionStatus};

use crate::domain::{ChunkRecord, FileRecord, UploadSession};

use super::error::PortResult;

/// Durable row-level state for sessions, chunks, and final file records
/// (spec §4.4).
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create_session(&self, session: &UploadSession) -> PortResult<()>;

    /// Owner scoping is enforced here: a session owned by someone else is
    /// indistinguishable from an unknown session (`Ok(None)`).
    async fn get_session(
        &self,
        session_id: SessionId,
        owner_id: &OwnerId,
    ) -> PortResult<Option<UploadSession>>;

    async fn update_session_status(
        &self,
        session_id: SessionId,
        new_status: SessionStatus,
        error_message: Option<String>,
    ) -> PortResult<()>;

    async fn record_chunk(&self, chunk: &ChunkRecord) -> PortResult<()>;

    /// Conditional update: succeeds (`true`) only when the session's
    /// current `received_chunks` equals `expected_index` and its status is
    /// `pending` or `in_progress`. Returns `false` — never an error — when
    /// the condition doesn't hold; the caller translates that into the
    /// idempotent-replay or out-of-order response (spec §4.4/§4.2).
    async fn advance_progress(
        &self,
        session_id: SessionId,
        expected_index: u32,
        chunk_bytes: u64,
    ) -> PortResult<bool>;

    async fn list_chunks(&self, session_id: SessionId) -> PortResult<Vec<ChunkRecord>>;

    async fn reset_chunks(&self, session_id: SessionId) -> PortResult<()>;

    async fn set_manifest_path(&self, session_id: SessionId, path: &str) -> PortResult<()>;

    /// Idempotent: sets file id, sets status to `completed`, stamps
    /// completion time. Called only from the Materializer's success path.
    async fn link_file(&self, session_id: SessionId, file_id: FileId) -> PortResult<()>;

    async fn insert_file_record(&self, record: &FileRecord) -> PortResult<()>;

    /// Library-level sweep helper (SPEC_FULL §11): returns session ids that
    /// are non-terminal and past `cutoff`. Not invoked by anything in this
    /// crate except tests — running it on a schedule is a separate concern.
    async fn reclaim_expired(&self, cutoff: DateTime<Utc>) -> PortResult<Vec<SessionId>>;
}

/// A staged chunk on local disk (spec §4.3).
#[derive(Debug, Clone)]
pub struct StagedChunk {
    pub scratch_path: String,
    pub byte_count: u64,
    pub server_digest: String,
}

/// Persists chunk bytes to local disk with atomic rename (spec §4.3).
#[async_trait]
pub trait ScratchStore: Send + Sync {
    async fn write_chunk(
        &self,
        session_id: SessionId,
        chunk_index: u32,
        data: Bytes,
    ) -> PortResult<StagedChunk>;

    /// Deletes the entire session subtree. Must succeed even if partially
    /// populated and must be safe to call more than once.
    async fn remove_session(&self, session_id: SessionId) -> PortResult<()>;
}

/// Outcome of a successful materialization (spec §4.6), handed back to the
/// Session Service so it can call `link_file` / `insert_file_record`.
#[derive(Debug, Clone)]
pub struct MaterializeOutcome {
    pub file_record: FileRecord,
    /// Set only by strategies that write a manifest (`repo-chunks`/`git-lfs`);
    /// `None` for `release-asset`/`inline-blob` (spec §4.4/§4.6).
    pub manifest_path: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MaterializeFailure(pub String);

/// Narrow seam the Session Service calls through at `finalize` time,
/// implemented by the `materialize` feature. Declared here (rather than in
/// `materialize::ports`) so that `session` depends only on domain types and
/// never reaches into `materialize`'s internals.
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(
        &self,
        session: &UploadSession,
        chunks: Vec<ChunkRecord>,
    ) -> Result<MaterializeOutcome, MaterializeFailure>;
}
