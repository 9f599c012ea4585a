// crates/upload-core/src/infrastructure/scratch_store.rs
//
// Local-disk staging (spec §4.3): a chunk is written to `<path>.partial`,
// digested in-stream, then atomically renamed to `<path>`. The store is
// oblivious to sessions and strategies — it's a plain content cache keyed by
// `(session_id, chunk_index)`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use shared::SessionId;
use tracing::debug;

use crate::features::session::error::{PortResult, SessionError};
use crate::features::session::ports::{ScratchStore, StagedChunk};

pub struct FsScratchStore {
    base_dir: PathBuf,
}

impl FsScratchStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn session_dir(&self, session_id: SessionId) -> PathBuf {
        self.base_dir.join(session_id.to_string())
    }

    fn chunk_path(&self, session_id: SessionId, chunk_index: u32) -> PathBuf {
        self.session_dir(session_id)
            .join("chunks")
            .join(format!("chunk-{chunk_index:05}"))
    }
}

#[async_trait]
impl ScratchStore for FsScratchStore {
    async fn write_chunk(
        &self,
        session_id: SessionId,
        chunk_index: u32,
        data: Bytes,
    ) -> PortResult<StagedChunk> {
        let final_path = self.chunk_path(session_id, chunk_index);
        let partial_path = final_path.with_extension("partial");

        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SessionError::Infrastructure(format!("creating scratch dir: {e}")))?;
        }

        let digest = hex::encode(Sha256::digest(&data));

        tokio::fs::write(&partial_path, &data)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("writing partial chunk: {e}")))?;
        tokio::fs::rename(&partial_path, &final_path)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("renaming partial chunk: {e}")))?;

        debug!(upload_id = %session_id, chunk_index, bytes = data.len(), "chunk staged");

        Ok(StagedChunk {
            scratch_path: final_path.to_string_lossy().into_owned(),
            byte_count: data.len() as u64,
            server_digest: digest,
        })
    }

    async fn remove_session(&self, session_id: SessionId) -> PortResult<()> {
        let dir = self.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Infrastructure(format!(
                "removing scratch dir {}: {e}",
                dir.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_remove_round_trips() {
        let dir = tempdir();
        let store = FsScratchStore::new(dir.clone());
        let session_id = SessionId::new();

        let staged = store
            .write_chunk(session_id, 0, Bytes::from_static(b"hello world"))
            .await
            .unwrap();
        assert_eq!(staged.byte_count, 11);
        assert!(tokio::fs::metadata(&staged.scratch_path).await.is_ok());

        store.remove_session(session_id).await.unwrap();
        assert!(tokio::fs::metadata(&staged.scratch_path).await.is_err());

        // idempotent
        store.remove_session(session_id).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn identical_bytes_produce_identical_digest() {
        let dir = tempdir();
        let store = FsScratchStore::new(dir.clone());
        let session_id = SessionId::new();

        let a = store
            .write_chunk(session_id, 0, Bytes::from_static(b"same"))
            .await
            .unwrap();
        let b = store
            .write_chunk(session_id, 1, Bytes::from_static(b"same"))
            .await
            .unwrap();
        assert_eq!(a.server_digest, b.server_digest);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("upload-core-scratch-test-{}", uuid::Uuid::new_v4()));
        p
    }
}
