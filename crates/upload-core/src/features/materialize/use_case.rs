// crates/upload-core/src/features/materialize/use_case.rs
//
// Dispatches to the per-strategy assembly procedure (spec §4.6) and owns the
// one retry/backoff policy all remote writes go through (spec §9 redesign
// note: concentrate retry in the Remote Client instead of scattering ad-hoc
// loops across call sites).

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{ChunkRecord, UploadSession};
use crate::features::session::ports::{
    MaterializeFailure, MaterializeOutcome, Materializer as MaterializerPort,
};
use shared::StorageStrategy;

use super::error::RemoteError;
use super::ports::RemoteClient;
use super::{inline_blob, release_asset, repo_chunks};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

pub struct RemoteMaterializer {
    remote: Arc<dyn RemoteClient>,
    retry: RetryPolicy,
    assemble_dir: PathBuf,
}

impl RemoteMaterializer {
    pub fn new(remote: Arc<dyn RemoteClient>, retry: RetryPolicy, assemble_dir: PathBuf) -> Self {
        Self {
            remote,
            retry,
            assemble_dir,
        }
    }

    fn check_common_preconditions(
        session: &UploadSession,
        chunks: &[ChunkRecord],
    ) -> Result<(), MaterializeFailure> {
        if chunks.len() != session.total_chunks as usize {
            return Err(MaterializeFailure(format!(
                "expected {} chunks, found {}",
                session.total_chunks,
                chunks.len()
            )));
        }
        let total: u64 = chunks.iter().map(|c| c.size_bytes).sum();
        if total != session.declared_size {
            return Err(MaterializeFailure(format!(
                "assembled size {total} does not match declared size {}",
                session.declared_size
            )));
        }
        let mut indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        indices.sort_unstable();
        for (expected, actual) in (0..session.total_chunks).zip(indices.iter()) {
            if expected != *actual {
                return Err(MaterializeFailure(format!(
                    "missing chunk at index {expected}"
                )));
            }
        }
        Ok(())
    }

    /// Retries transient failures and rate limits with exponential backoff;
    /// gives up immediately on anything else.
    pub(crate) async fn retry<F, Fut, T>(&self, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) if err.is_retriable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.base_delay * 2u32.pow(attempt);
                    warn!(attempt, ?delay, error = %err, "retrying remote call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) fn assemble_dir(&self) -> &PathBuf {
        &self.assemble_dir
    }
}

#[async_trait]
impl MaterializerPort for RemoteMaterializer {
    async fn materialize(
        &self,
        session: &UploadSession,
        mut chunks: Vec<ChunkRecord>,
    ) -> Result<MaterializeOutcome, MaterializeFailure> {
        Self::check_common_preconditions(session, &chunks)?;
        chunks.sort_by_key(|c| c.chunk_index);

        let (record, manifest_path) = match session.strategy {
            StorageStrategy::RepoChunks | StorageStrategy::GitLfs => {
                repo_chunks::materialize(self, self.remote.as_ref(), session, &chunks).await?
            }
            StorageStrategy::ReleaseAsset => (
                release_asset::materialize(self, self.remote.as_ref(), session, &chunks).await?,
                None,
            ),
            StorageStrategy::InlineBlob => (
                inline_blob::materialize(self, self.remote.as_ref(), session, &chunks).await?,
                None,
            ),
        };

        Ok(MaterializeOutcome {
            file_record: record,
            manifest_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use bytes::Bytes;
    use chrono::Utc;
    use shared::{OwnerId, SessionId, SessionStatus};

    use super::*;
    use crate::domain::ChunkRecord;

    /// Fails its first `fail_times` calls to `put_file` with a transient
    /// error, then succeeds; records every path it was asked to write.
    struct MockRemote {
        fail_times: u32,
        attempts: AtomicU32,
        written_paths: Mutex<Vec<String>>,
    }

    impl MockRemote {
        fn new(fail_times: u32) -> Self {
            Self {
                fail_times,
                attempts: AtomicU32::new(0),
                written_paths: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteClient for MockRemote {
        async fn put_file(
            &self,
            _repo: &str,
            path: &str,
            _commit_message: &str,
            _bytes: Bytes,
        ) -> Result<String, RemoteError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_times {
                return Err(RemoteError::Transient("simulated outage".into()));
            }
            self.written_paths.lock().unwrap().push(path.to_string());
            Ok("deadbeef".into())
        }

        async fn delete_path(&self, _repo: &str, _path: &str, _commit_message: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn ensure_release(&self, _repo: &str, _tag: &str, _name: &str, _body: &str) -> Result<String, RemoteError> {
            Ok("release-1".into())
        }

        async fn upload_release_asset(
            &self,
            _repo: &str,
            _release_id: &str,
            _asset_name: &str,
            _content_type: &str,
            _local_file: &std::path::Path,
        ) -> Result<String, RemoteError> {
            Ok("asset-1".into())
        }
    }

    struct AlwaysPermanent;

    #[async_trait]
    impl RemoteClient for AlwaysPermanent {
        async fn put_file(&self, _repo: &str, _path: &str, _commit_message: &str, _bytes: Bytes) -> Result<String, RemoteError> {
            Err(RemoteError::Permanent("no access".into()))
        }
        async fn delete_path(&self, _repo: &str, _path: &str, _commit_message: &str) -> Result<(), RemoteError> {
            Ok(())
        }
        async fn ensure_release(&self, _repo: &str, _tag: &str, _name: &str, _body: &str) -> Result<String, RemoteError> {
            Err(RemoteError::Permanent("no access".into()))
        }
        async fn upload_release_asset(
            &self,
            _repo: &str,
            _release_id: &str,
            _asset_name: &str,
            _content_type: &str,
            _local_file: &std::path::Path,
        ) -> Result<String, RemoteError> {
            Err(RemoteError::Permanent("no access".into()))
        }
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("upload-core-materialize-test-{}", uuid::Uuid::new_v4()));
        p
    }

    async fn stage_chunks(dir: &PathBuf, contents: &[&[u8]]) -> Vec<ChunkRecord> {
        tokio::fs::create_dir_all(dir).await.unwrap();
        let session_id = SessionId::new();
        let mut chunks = Vec::with_capacity(contents.len());
        for (i, body) in contents.iter().enumerate() {
            let path = dir.join(format!("chunk-{i:05}"));
            tokio::fs::write(&path, body).await.unwrap();
            chunks.push(ChunkRecord {
                session_id,
                chunk_index: i as u32,
                size_bytes: body.len() as u64,
                client_digest: None,
                server_digest: format!("digest-{i}"),
                scratch_path: path.to_string_lossy().to_string(),
                received_at: Utc::now(),
            });
        }
        chunks
    }

    fn session_for(strategy: StorageStrategy, declared_size: u64, total_chunks: u32) -> UploadSession {
        let now = Utc::now();
        UploadSession {
            id: SessionId::new(),
            owner_id: OwnerId::from("owner-1"),
            file_name: "report.pdf".into(),
            declared_size,
            mime_hint: Some("application/pdf".into()),
            target_path: "reports/report.pdf".into(),
            chunk_size: 1024,
            total_chunks,
            strategy,
            target_repository: "acme/archive".into(),
            expires_at: now + chrono::Duration::hours(1),
            created_at: now,
            status: SessionStatus::InProgress,
            received_chunks: total_chunks,
            received_bytes: declared_size,
            error_message: None,
            manifest_path: None,
            final_blob_path: None,
            final_file_id: None,
            completed_at: None,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn repo_chunks_materialize_writes_every_chunk_and_a_manifest() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"aaaa", b"bbbb"]).await;
        let session = session_for(StorageStrategy::RepoChunks, 8, 2);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote.clone(), RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await.unwrap();

        assert_eq!(outcome.file_record.size_bytes, 8);
        assert_eq!(outcome.file_record.strategy, StorageStrategy::RepoChunks);
        assert!(outcome.manifest_path.as_deref().unwrap().ends_with("manifest.json"));
        let written = remote.written_paths.lock().unwrap();
        // 2 chunk writes + 1 manifest write
        assert_eq!(written.len(), 3);
        assert!(written.iter().any(|p| p.ends_with("manifest.json")));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn inline_blob_materialize_reports_no_manifest_path() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"xx"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 2, 1);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote, RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await.unwrap();

        assert!(outcome.manifest_path.is_none());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn git_lfs_strategy_routes_through_repo_chunks() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"only"]).await;
        let session = session_for(StorageStrategy::GitLfs, 4, 1);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote.clone(), RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await.unwrap();

        assert_eq!(outcome.file_record.strategy, StorageStrategy::GitLfs);
        assert_eq!(remote.written_paths.lock().unwrap().len(), 2);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn release_asset_materialize_records_asset_name_in_metadata() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"aaaa", b"bbbb"]).await;
        let session = session_for(StorageStrategy::ReleaseAsset, 8, 2);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote, RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await.unwrap();

        assert_eq!(
            outcome.file_record.strategy_metadata["assetName"],
            serde_json::json!("report.pdf")
        );
        assert!(outcome.manifest_path.is_none());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn inline_blob_materialize_concatenates_chunks_into_one_write() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"hello ", b"world"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 11, 2);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote.clone(), RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await.unwrap();

        assert_eq!(outcome.file_record.remote_blob_ref, "reports/report.pdf");
        assert_eq!(remote.written_paths.lock().unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_failures_within_max_attempts() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"xx"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 2, 1);
        // 2 transient failures then success, well within the default 5 attempts.
        let remote = Arc::new(MockRemote::new(2));
        let mut policy = RetryPolicy::default();
        policy.base_delay = std::time::Duration::from_millis(1);
        let materializer = RemoteMaterializer::new(remote.clone(), policy, dir.clone());

        let outcome = materializer.materialize(&session, chunks).await;

        assert!(outcome.is_ok());
        assert_eq!(remote.written_paths.lock().unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"xx"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 2, 1);
        let remote = Arc::new(AlwaysPermanent);
        let materializer = RemoteMaterializer::new(remote, RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await;

        assert!(outcome.is_err());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn rejects_when_chunk_count_does_not_match_declared_total() {
        let dir = tempdir();
        // session expects 2 chunks but only 1 was staged
        let chunks = stage_chunks(&dir, &[b"xx"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 4, 2);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote.clone(), RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await;

        assert!(outcome.is_err());
        assert!(remote.written_paths.lock().unwrap().is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn rejects_when_assembled_size_mismatches_declared_size() {
        let dir = tempdir();
        let chunks = stage_chunks(&dir, &[b"xx", b"xx"]).await;
        let session = session_for(StorageStrategy::InlineBlob, 999, 2);
        let remote = Arc::new(MockRemote::new(0));
        let materializer = RemoteMaterializer::new(remote.clone(), RetryPolicy::default(), dir.clone());

        let outcome = materializer.materialize(&session, chunks).await;

        assert!(outcome.is_err());
        assert!(remote.written_paths.lock().unwrap().is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
