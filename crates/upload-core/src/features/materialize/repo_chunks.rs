// crates/upload-core/src/features/materialize/repo_chunks.rs
//
// `repo-chunks` assembly (spec §4.6): each chunk is pushed to the target
// repository as its own file, followed by a manifest.json describing how to
// reassemble them. `git-lfs` aliases to this procedure (spec §9).

use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use shared::{FileId, StorageStrategy};

use crate::domain::{ChunkRecord, FileRecord, Manifest, ManifestChunkEntry, UploadSession};
use crate::domain::manifest::MANIFEST_SCHEMA_VERSION;
use crate::features::session::ports::MaterializeFailure;

use super::ports::RemoteClient;
use super::use_case::RemoteMaterializer;

fn chunk_path(session: &UploadSession, chunk_index: u32) -> String {
    format!(
        "uploads/{}/{}/chunks/chunk-{:05}",
        session.owner_id.0, session.id, chunk_index
    )
}

pub(super) async fn materialize(
    materializer: &RemoteMaterializer,
    remote: &dyn RemoteClient,
    session: &UploadSession,
    chunks: &[ChunkRecord],
) -> Result<(FileRecord, Option<String>), MaterializeFailure> {
    let mut manifest_chunks = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let bytes = tokio::fs::read(&chunk.scratch_path)
            .await
            .map(Bytes::from)
            .map_err(|e| MaterializeFailure(format!("reading staged chunk {}: {e}", chunk.chunk_index)))?;
        let path = chunk_path(session, chunk.chunk_index);
        let commit_message = format!("upload chunk {} of {}", chunk.chunk_index, session.file_name);

        materializer
            .retry(|| remote.put_file(&session.target_repository, &path, &commit_message, bytes.clone()))
            .await
            .map_err(|e| MaterializeFailure(format!("writing chunk {}: {e}", chunk.chunk_index)))?;

        manifest_chunks.push(ManifestChunkEntry {
            index: chunk.chunk_index,
            size: chunk.size_bytes,
            checksum: chunk.server_digest.clone(),
            path,
        });
    }

    let chunks_path = format!("uploads/{}/{}/chunks", session.owner_id.0, session.id);
    let manifest = Manifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        strategy: StorageStrategy::RepoChunks.to_string(),
        upload_id: session.id.to_string(),
        user_id: session.owner_id.0.clone(),
        file_name: session.file_name.clone(),
        size_bytes: session.declared_size,
        chunk_size: session.chunk_size,
        total_chunks: session.total_chunks,
        chunks_path: chunks_path.clone(),
        chunks: manifest_chunks,
        created_at: Utc::now(),
    };

    let manifest_path = format!("uploads/{}/{}/manifest.json", session.owner_id.0, session.id);
    let manifest_bytes = Bytes::from(
        serde_json::to_vec_pretty(&manifest)
            .map_err(|e| MaterializeFailure(format!("encoding manifest: {e}")))?,
    );
    materializer
        .retry(|| {
            remote.put_file(
                &session.target_repository,
                &manifest_path,
                "add upload manifest",
                manifest_bytes.clone(),
            )
        })
        .await
        .map_err(|e| MaterializeFailure(format!("writing manifest: {e}")))?;

    let record = FileRecord {
        id: FileId::new(),
        owner_id: session.owner_id.clone(),
        display_name: session.file_name.clone(),
        logical_path: session.target_path.clone(),
        remote_repository: session.target_repository.clone(),
        remote_blob_ref: manifest_path.clone(),
        strategy: session.strategy,
        strategy_metadata: json!({
            "manifestPath": manifest_path,
            "chunksPath": chunks_path,
        }),
        size_bytes: session.declared_size,
        created_at: Utc::now(),
    };

    Ok((record, Some(manifest_path)))
}
