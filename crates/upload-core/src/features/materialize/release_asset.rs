// crates/upload-core/src/features/materialize/release_asset.rs
//
// `release-asset` assembly (spec §4.6): chunks are concatenated into a
// single local file, then uploaded as a GitHub release asset.

use serde_json::json;
use shared::FileId;
use tokio::io::AsyncWriteExt;

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
    let assembled_path = materializer.assemble_dir().join(format!("{}.assembled", session.id));

    {
        let mut out = tokio::fs::File::create(&assembled_path)
            .await
            .map_err(|e| MaterializeFailure(format!("creating assembly file: {e}")))?;
        for chunk in chunks {
            let bytes = tokio::fs::read(&chunk.scratch_path)
                .await
                .map_err(|e| MaterializeFailure(format!("reading staged chunk {}: {e}", chunk.chunk_index)))?;
            out.write_all(&bytes)
                .await
                .map_err(|e| MaterializeFailure(format!("assembling chunk {}: {e}", chunk.chunk_index)))?;
        }
        out.flush()
            .await
            .map_err(|e| MaterializeFailure(format!("flushing assembly file: {e}")))?;
    }

    let tag = format!("upload-{}", session.id);
    let release_id = materializer
        .retry(|| {
            remote.ensure_release(
                &session.target_repository,
                &tag,
                &tag,
                "Automated chunked upload release",
            )
        })
        .await
        .map_err(|e| MaterializeFailure(format!("ensuring release: {e}")))?;

    let content_type = mime_guess::from_path(&session.file_name)
        .first_or_octet_stream()
        .to_string();

    let asset_id = materializer
        .retry(|| {
            remote.upload_release_asset(
                &session.target_repository,
                &release_id,
                &session.file_name,
                &content_type,
                &assembled_path,
            )
        })
        .await
        .map_err(|e| MaterializeFailure(format!("uploading release asset: {e}")));

    let _ = tokio::fs::remove_file(&assembled_path).await;
    let asset_id = asset_id?;

    let blob_ref = format!("release:{release_id}:{asset_id}");
    Ok(FileRecord {
        id: FileId::new(),
        owner_id: session.owner_id.clone(),
        display_name: session.file_name.clone(),
        logical_path: session.target_path.clone(),
        remote_repository: session.target_repository.clone(),
        remote_blob_ref: blob_ref,
        strategy: session.strategy,
        strategy_metadata: json!({
            "releaseId": release_id,
            "assetId": asset_id,
            "assetName": session.file_name,
            "tag": tag,
        }),
        size_bytes: session.declared_size,
        created_at: chrono::Utc::now(),
    })
}
