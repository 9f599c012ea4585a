// crates/upload-core/src/domain/manifest.rs
//
// Canonical JSON manifest written alongside `repo-chunks` uploads (spec §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANIFEST_SCHEMA_VERSION: &str = "2024-11-01";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    pub strategy: String,
    #[serde(rename = "uploadId")]
    pub upload_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
    #[serde(rename = "chunkSize")]
    pub chunk_size: u64,
    #[serde(rename = "totalChunks")]
    pub total_chunks: u32,
    #[serde(rename = "chunksPath")]
    pub chunks_path: String,
    pub chunks: Vec<ManifestChunkEntry>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestChunkEntry {
    pub index: u32,
    pub size: u64,
    pub checksum: String,
    pub path: String,
}
