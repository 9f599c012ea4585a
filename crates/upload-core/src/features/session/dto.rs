// crates/upload-core/src/features/session/dto.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{FileId, OwnerId, SessionId, SessionStatus, StorageStrategy};

#[derive(Debug, Clone)]
pub struct InitUploadCommand {
    pub owner_id: OwnerId,
    pub file_name: String,
    pub declared_size: u64,
    pub mime_hint: Option<String>,
    pub target_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadResponse {
    pub upload_id: SessionId,
    pub chunk_size: u64,
    pub total_chunks: u32,
    pub strategy: StorageStrategy,
    pub repo_name: String,
    pub max_upload_size: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PutChunkCommand {
    pub session_id: SessionId,
    pub owner_id: OwnerId,
    pub chunk_index: u32,
    pub client_digest: Option<String>,
    pub bytes: bytes::Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutChunkResponse {
    pub received_chunk: u32,
    pub next_chunk_index: u32,
    pub is_complete: bool,
}

#[derive(Debug, Clone)]
pub struct FinalizeCommand {
    pub session_id: SessionId,
    pub owner_id: OwnerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub file_id: FileId,
    pub path: String,
    pub name: String,
    pub size: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AbortCommand {
    pub session_id: SessionId,
    pub owner_id: OwnerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone)]
pub struct StatusQuery {
    pub session_id: SessionId,
    pub owner_id: OwnerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub upload_id: SessionId,
    pub status: SessionStatus,
    pub strategy: StorageStrategy,
    pub received_bytes: u64,
    pub received_chunks: u32,
    pub total_chunks: u32,
    pub chunk_size: u64,
    pub next_chunk: u32,
}
