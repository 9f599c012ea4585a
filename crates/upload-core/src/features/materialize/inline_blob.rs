// crates/upload-core/src/features/materialize/inline_blob.rs
//
// `inline-blob` assembly (spec §4.6): small uploads are written as a single
// file directly to the target path, no manifest, no release.

use bytes::{Bytes, BytesMut};
use serde_json::json;
use shared::FileId;

use crate::domain::{ChunkRecord, FileRecord, UploadSession};
use crate::features::session::ports::MaterializeFailure;

use super::ports::RemoteClient;
use super::use_case::RemoteMaterializer;

pub(super) async fn materialize(
    materializer: &RemoteMaterializer,
    remote: &dyn RemoteClient,
    session: &UploadSession,
    chunks: &[ChunkRecord],
) -> Result<FileRecord, MaterializeFailure> {
    let mut buf = BytesMut::with_capacity(session.declared_size as usize);
    for chunk in chunks {
        let bytes = tokio::fs::read(&chunk.scratch_path)
            .await
            .map_err(|e| MaterializeFailure(format!("reading staged chunk {}: {e}", chunk.chunk_index)))?;
        buf.extend_from_slice(&bytes);
    }
    let content: Bytes = buf.freeze();

    let commit_message = format!("upload {}", session.file_name);
    materializer
        .retry(|| remote.put_file(&session.target_repository, &session.target_path, &commit_message, content.clone()))
        .await
        .map_err(|e| MaterializeFailure(format!("writing blob: {e}")))?;

    Ok(FileRecord {
        id: FileId::new(),
        owner_id: session.owner_id.clone(),
        display_name: session.file_name.clone(),
        logical_path: session.target_path.clone(),
        remote_repository: session.target_repository.clone(),
        remote_blob_ref: session.target_path.clone(),
        strategy: session.strategy,
        strategy_metadata: json!({}),
        size_bytes: session.declared_size,
        created_at: chrono::Utc::now(),
    })
}
