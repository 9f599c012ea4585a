// crates/upload-core/src/features/session/use_case.rs
//
// SessionService: the state machine described in spec §4.2. Everything that
// is not pure (strategy selection, policy defaults) lives here; everything
// that is pure lives in `strategy.rs`.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use shared::SessionStatus;
use tracing::{info, instrument, warn};

use crate::domain::{ChunkRecord, UploadSession};

use super::dto::{
    AbortCommand, AbortResponse, FinalizeCommand, FinalizeResponse, InitUploadCommand,
    InitUploadResponse, PutChunkCommand, PutChunkResponse, StatusQuery, StatusResponse,
};
use super::error::{PortResult, SessionError};
use super::policy::UploadPolicy;
use super::ports::{MetadataStore, Materializer, ScratchStore};
use super::strategy::{select_chunk_size, select_strategy};

pub struct SessionService {
    metadata: Arc<dyn MetadataStore>,
    scratch: Arc<dyn ScratchStore>,
    materializer: Arc<dyn Materializer>,
    policy: UploadPolicy,
    target_repository: String,
}

impl SessionService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        scratch: Arc<dyn ScratchStore>,
        materializer: Arc<dyn Materializer>,
        policy: UploadPolicy,
        target_repository: String,
    ) -> Self {
        Self {
            metadata,
            scratch,
            materializer,
            policy,
            target_repository,
        }
    }

    #[instrument(skip(self, cmd), fields(owner_id = %cmd.owner_id, file_name = %cmd.file_name))]
    pub async fn init(&self, cmd: InitUploadCommand) -> PortResult<InitUploadResponse> {
        if cmd.file_name.trim().is_empty() {
            return Err(SessionError::Validation("file_name must not be empty".into()));
        }
        if cmd.declared_size == 0 {
            return Err(SessionError::Validation("declared_size must be > 0".into()));
        }
        if cmd.declared_size > self.policy.max_upload_size {
            return Err(SessionError::Validation(format!(
                "declared_size {} exceeds max_upload_size {}",
                cmd.declared_size, self.policy.max_upload_size
            )));
        }
        if cmd.target_path.trim().is_empty() {
            return Err(SessionError::Validation("target_path must not be empty".into()));
        }

        let chunk_size = select_chunk_size(cmd.declared_size, &self.policy);
        let total_chunks = crate::domain::session::total_chunks_for(cmd.declared_size, chunk_size);
        let strategy = select_strategy(cmd.declared_size, &self.policy);
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.policy.session_ttl_hours);

        let session = UploadSession {
            id: shared::SessionId::new(),
            owner_id: cmd.owner_id,
            file_name: cmd.file_name,
            declared_size: cmd.declared_size,
            mime_hint: cmd.mime_hint,
            target_path: cmd.target_path,
            chunk_size,
            total_chunks,
            strategy,
            target_repository: self.target_repository.clone(),
            expires_at,
            created_at: now,
            status: SessionStatus::Pending,
            received_chunks: 0,
            received_bytes: 0,
            error_message: None,
            manifest_path: None,
            final_blob_path: None,
            final_file_id: None,
            completed_at: None,
            updated_at: now,
        };

        self.metadata.create_session(&session).await?;
        info!(upload_id = %session.id, strategy = %strategy, total_chunks, "upload session created");

        Ok(InitUploadResponse {
            upload_id: session.id,
            chunk_size,
            total_chunks,
            strategy,
            repo_name: session.target_repository,
            max_upload_size: self.policy.max_upload_size,
            expires_at,
        })
    }

    #[instrument(skip(self, cmd), fields(upload_id = %cmd.session_id, chunk_index = cmd.chunk_index))]
    pub async fn put_chunk(&self, cmd: PutChunkCommand) -> PortResult<PutChunkResponse> {
        let session = self.load_live_session(cmd.session_id, &cmd.owner_id).await?;

        if cmd.chunk_index >= session.total_chunks {
            return Err(SessionError::Validation(format!(
                "chunk_index {} out of range (total_chunks {})",
                cmd.chunk_index, session.total_chunks
            )));
        }

        let expected = session.next_expected_chunk();
        if cmd.chunk_index < expected {
            // Already-received chunk replayed: idempotent success, no bytes
            // touched (spec §4.2).
            return Ok(PutChunkResponse {
                received_chunk: cmd.chunk_index,
                next_chunk_index: expected,
                is_complete: session.is_complete(),
            });
        }
        if cmd.chunk_index > expected {
            return Err(SessionError::Ordering(format!(
                "expected chunk {expected}, got {}",
                cmd.chunk_index
            )));
        }

        let is_last = cmd.chunk_index + 1 == session.total_chunks;
        let expected_size = if is_last {
            session.declared_size - (cmd.chunk_index as u64) * session.chunk_size
        } else {
            session.chunk_size
        };
        let actual_size = cmd.bytes.len() as u64;
        if actual_size != expected_size {
            return Err(SessionError::Integrity(format!(
                "chunk size mismatch: expected {expected_size} bytes, got {actual_size}"
            )));
        }

        let computed_digest = hex::encode(Sha256::digest(&cmd.bytes));
        if let Some(client_digest) = &cmd.client_digest {
            if !client_digest.eq_ignore_ascii_case(&computed_digest) {
                return Err(SessionError::Integrity(
                    "checksum mismatch between client and server digest".into(),
                ));
            }
        }

        let staged = self
            .scratch
            .write_chunk(session.id, cmd.chunk_index, cmd.bytes)
            .await?;
        if staged.server_digest != computed_digest {
            return Err(SessionError::Infrastructure(
                "scratch store digest disagrees with pre-write digest".into(),
            ));
        }

        let chunk = ChunkRecord {
            session_id: session.id,
            chunk_index: cmd.chunk_index,
            size_bytes: staged.byte_count,
            client_digest: cmd.client_digest,
            server_digest: staged.server_digest,
            scratch_path: staged.scratch_path,
            received_at: Utc::now(),
        };
        self.metadata.record_chunk(&chunk).await?;

        let advanced = self
            .metadata
            .advance_progress(session.id, expected, staged.byte_count)
            .await?;

        if !advanced {
            // Lost a race, or the session moved on/out from under us between
            // the load above and here. Re-read and reconcile rather than
            // guess.
            let current = self.load_live_session(session.id, &cmd.owner_id).await?;
            if current.status.is_terminal() {
                return Err(SessionError::State(format!(
                    "session is {:?}",
                    current.status
                )));
            }
            return Ok(PutChunkResponse {
                received_chunk: cmd.chunk_index,
                next_chunk_index: current.next_expected_chunk(),
                is_complete: current.is_complete(),
            });
        }

        if session.status == SessionStatus::Pending {
            self.metadata
                .update_session_status(session.id, SessionStatus::InProgress, None)
                .await?;
        }

        let next_chunk_index = expected + 1;
        let is_complete = next_chunk_index == session.total_chunks;
        Ok(PutChunkResponse {
            received_chunk: cmd.chunk_index,
            next_chunk_index,
            is_complete,
        })
    }

    #[instrument(skip(self, cmd), fields(upload_id = %cmd.session_id))]
    pub async fn finalize(&self, cmd: FinalizeCommand) -> PortResult<FinalizeResponse> {
        let session = self.load_or_expire(cmd.session_id, &cmd.owner_id).await?;

        if session.status == SessionStatus::Completed {
            let file_id = session
                .final_file_id
                .ok_or_else(|| SessionError::Infrastructure("completed session missing file id".into()))?;
            let completed_at = session
                .completed_at
                .ok_or_else(|| SessionError::Infrastructure("completed session missing timestamp".into()))?;
            return Ok(FinalizeResponse {
                file_id,
                path: session
                    .final_blob_path
                    .unwrap_or_else(|| session.target_path.clone()),
                name: session.file_name,
                size: session.declared_size,
                completed_at,
            });
        }
        if session.status.is_terminal() {
            return Err(SessionError::State(format!(
                "cannot finalize a session in state {:?}",
                session.status
            )));
        }
        if session.received_chunks != session.total_chunks {
            return Err(SessionError::State(format!(
                "incomplete chunk set: received {} of {}",
                session.received_chunks, session.total_chunks
            )));
        }

        self.metadata
            .update_session_status(session.id, SessionStatus::Processing, None)
            .await?;

        let chunks = self.metadata.list_chunks(session.id).await?;
        match self.materializer.materialize(&session, chunks).await {
            Ok(outcome) => {
                self.metadata.insert_file_record(&outcome.file_record).await?;
                if let Some(manifest_path) = &outcome.manifest_path {
                    self.metadata.set_manifest_path(session.id, manifest_path).await?;
                }
                self.metadata
                    .link_file(session.id, outcome.file_record.id)
                    .await?;
                self.scratch.remove_session(session.id).await?;
                let completed_at = Utc::now();
                info!(upload_id = %session.id, file_id = %outcome.file_record.id, "upload finalized");
                Ok(FinalizeResponse {
                    file_id: outcome.file_record.id,
                    path: outcome.file_record.logical_path,
                    name: outcome.file_record.display_name,
                    size: outcome.file_record.size_bytes,
                    completed_at,
                })
            }
            Err(failure) => {
                warn!(upload_id = %session.id, error = %failure, "finalize failed, scratch retained");
                self.metadata
                    .update_session_status(session.id, SessionStatus::Failed, Some(failure.0.clone()))
                    .await?;
                Err(SessionError::Infrastructure(failure.0))
            }
        }
    }

    #[instrument(skip(self, cmd), fields(upload_id = %cmd.session_id))]
    pub async fn abort(&self, cmd: AbortCommand) -> PortResult<AbortResponse> {
        let session = self
            .metadata
            .get_session(cmd.session_id, &cmd.owner_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(cmd.session_id.to_string()))?;
        session
            .check_invariants()
            .map_err(SessionError::Infrastructure)?;

        if session.status == SessionStatus::Completed {
            return Err(SessionError::State("cannot abort a completed session".into()));
        }
        if session.status == SessionStatus::Aborted {
            return Ok(AbortResponse { status: "aborted" });
        }

        self.metadata
            .update_session_status(session.id, SessionStatus::Aborted, None)
            .await?;
        self.metadata.reset_chunks(session.id).await?;
        self.scratch.remove_session(session.id).await?;
        info!(upload_id = %session.id, "upload aborted");

        Ok(AbortResponse { status: "aborted" })
    }

    #[instrument(skip(self, query), fields(upload_id = %query.session_id))]
    pub async fn status(&self, query: StatusQuery) -> PortResult<StatusResponse> {
        let session = self.load_or_expire(query.session_id, &query.owner_id).await?;
        Ok(StatusResponse {
            upload_id: session.id,
            status: session.status,
            strategy: session.strategy,
            received_bytes: session.received_bytes,
            received_chunks: session.received_chunks,
            total_chunks: session.total_chunks,
            chunk_size: session.chunk_size,
            next_chunk: session.next_expected_chunk(),
        })
    }

    /// Loads a session, applying the expiration-on-touch rule (spec §4.2):
    /// any non-terminal session whose `expires_at` has passed is flipped to
    /// `failed` before the caller sees it.
    async fn load_or_expire(
        &self,
        session_id: shared::SessionId,
        owner_id: &shared::OwnerId,
    ) -> PortResult<UploadSession> {
        let mut session = self
            .metadata
            .get_session(session_id, owner_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        session
            .check_invariants()
            .map_err(SessionError::Infrastructure)?;

        if session.is_expired(Utc::now()) {
            self.metadata
                .update_session_status(
                    session_id,
                    SessionStatus::Failed,
                    Some("session expired".into()),
                )
                .await?;
            session.status = SessionStatus::Failed;
            session.error_message = Some("session expired".into());
        }
        Ok(session)
    }

    /// Same as `load_or_expire`, but returns `Expired` instead of handing
    /// back a now-failed session — used by `put_chunk`, where expiry must
    /// short-circuit the write rather than be silently tolerated.
    async fn load_live_session(
        &self,
        session_id: shared::SessionId,
        owner_id: &shared::OwnerId,
    ) -> PortResult<UploadSession> {
        let session = self.load_or_expire(session_id, owner_id).await?;
        if session.status == SessionStatus::Failed && session.error_message.as_deref() == Some("session expired") {
            return Err(SessionError::Expired(session_id.to_string()));
        }
        if session.status.is_terminal() {
            return Err(SessionError::State(format!(
                "session is {:?}",
                session.status
            )));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use shared::{FileId, OwnerId};

    use crate::domain::FileRecord;
    use crate::features::session::ports::{MaterializeFailure, MaterializeOutcome};

    use super::*;

    struct InMemoryMetadataStore {
        sessions: Mutex<HashMap<SessionId, UploadSession>>,
        chunks: Mutex<HashMap<SessionId, Vec<ChunkRecord>>>,
    }

    impl InMemoryMetadataStore {
        fn new() -> Self {
            Self {
                sessions: Mutex::new(HashMap::new()),
                chunks: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl MetadataStore for InMemoryMetadataStore {
        async fn create_session(&self, session: &UploadSession) -> PortResult<()> {
            self.sessions.lock().unwrap().insert(session.id, session.clone());
            Ok(())
        }

        async fn get_session(
            &self,
            session_id: SessionId,
            owner_id: &OwnerId,
        ) -> PortResult<Option<UploadSession>> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .get(&session_id)
                .filter(|s| &s.owner_id == owner_id)
                .cloned())
        }

        async fn update_session_status(
            &self,
            session_id: SessionId,
            new_status: SessionStatus,
            error_message: Option<String>,
        ) -> PortResult<()> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(session) = sessions.get_mut(&session_id) {
                session.status = new_status;
                session.error_message = error_message;
                session.updated_at = Utc::now();
            }
            Ok(())
        }

        async fn record_chunk(&self, chunk: &ChunkRecord) -> PortResult<()> {
            self.chunks
                .lock()
                .unwrap()
                .entry(chunk.session_id)
                .or_default()
                .push(chunk.clone());
            Ok(())
        }

        async fn advance_progress(
            &self,
            session_id: SessionId,
            expected_index: u32,
            chunk_bytes: u64,
        ) -> PortResult<bool> {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.get_mut(&session_id) else {
                return Ok(false);
            };
            if session.received_chunks != expected_index || session.status.is_terminal() {
                return Ok(false);
            }
            session.received_chunks += 1;
            session.received_bytes += chunk_bytes;
            session.updated_at = Utc::now();
            Ok(true)
        }

        async fn list_chunks(&self, session_id: SessionId) -> PortResult<Vec<ChunkRecord>> {
            Ok(self.chunks.lock().unwrap().get(&session_id).cloned().unwrap_or_default())
        }

        async fn reset_chunks(&self, session_id: SessionId) -> PortResult<()> {
            self.chunks.lock().unwrap().remove(&session_id);
            Ok(())
        }

        async fn set_manifest_path(&self, session_id: SessionId, path: &str) -> PortResult<()> {
            if let Some(session) = self.sessions.lock().unwrap().get_mut(&session_id) {
                session.manifest_path = Some(path.to_string());
            }
            Ok(())
        }

        async fn link_file(&self, session_id: SessionId, file_id: FileId) -> PortResult<()> {
            if let Some(session) = self.sessions.lock().unwrap().get_mut(&session_id) {
                session.status = SessionStatus::Completed;
                session.final_file_id = Some(file_id);
                session.completed_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn insert_file_record(&self, _record: &FileRecord) -> PortResult<()> {
            Ok(())
        }

        async fn reclaim_expired(&self, cutoff: chrono::DateTime<Utc>) -> PortResult<Vec<SessionId>> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .values()
                .filter(|s| !s.status.is_terminal() && s.expires_at < cutoff)
                .map(|s| s.id)
                .collect())
        }
    }

    struct InMemoryScratchStore {
        removed: Mutex<Vec<SessionId>>,
    }

    impl InMemoryScratchStore {
        fn new() -> Self {
            Self {
                removed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ScratchStore for InMemoryScratchStore {
        async fn write_chunk(
            &self,
            session_id: SessionId,
            chunk_index: u32,
            data: bytes::Bytes,
        ) -> PortResult<super::super::ports::StagedChunk> {
            let digest = hex::encode(Sha256::digest(&data));
            Ok(super::super::ports::StagedChunk {
                scratch_path: format!("/tmp/{session_id}/chunk-{chunk_index:05}"),
                byte_count: data.len() as u64,
                server_digest: digest,
            })
        }

        async fn remove_session(&self, session_id: SessionId) -> PortResult<()> {
            self.removed.lock().unwrap().push(session_id);
            Ok(())
        }
    }

    struct StubMaterializer {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Materializer for StubMaterializer {
        async fn materialize(
            &self,
            session: &UploadSession,
            _chunks: Vec<ChunkRecord>,
        ) -> Result<MaterializeOutcome, MaterializeFailure> {
            if self.fail {
                return Err(MaterializeFailure("simulated remote failure".into()));
            }
            Ok(MaterializeOutcome {
                file_record: FileRecord {
                    id: FileId::new(),
                    owner_id: session.owner_id.clone(),
                    display_name: session.file_name.clone(),
                    logical_path: session.target_path.clone(),
                    remote_repository: session.target_repository.clone(),
                    remote_blob_ref: "manifest.json".into(),
                    strategy: session.strategy,
                    strategy_metadata: serde_json::json!({}),
                    size_bytes: session.declared_size,
                    created_at: Utc::now(),
                },
                manifest_path: Some("manifest.json".into()),
            })
        }
    }

    fn service(fail_materialize: bool) -> SessionService {
        SessionService::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryScratchStore::new()),
            Arc::new(StubMaterializer { fail: fail_materialize }),
            UploadPolicy::default(),
            "artifact-store".into(),
        )
    }

    fn owner() -> OwnerId {
        OwnerId::from("owner-1")
    }

    async fn init_session(svc: &SessionService, size: u64) -> InitUploadResponse {
        svc.init(InitUploadCommand {
            owner_id: owner(),
            file_name: "video.mp4".into(),
            declared_size: size,
            mime_hint: Some("video/mp4".into()),
            target_path: "videos/video.mp4".into(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn init_computes_total_chunks_from_declared_size() {
        let svc = service(false);
        let resp = init_session(&svc, 12_000_000).await;
        assert_eq!(resp.total_chunks, 3);
        assert_eq!(resp.chunk_size, 5 * 1024 * 1024);
    }

    #[tokio::test]
    async fn put_chunk_accepts_in_order_and_advances_next_index() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;

        let resp = svc
            .put_chunk(PutChunkCommand {
                session_id: init.upload_id,
                owner_id: owner(),
                chunk_index: 0,
                client_digest: None,
                bytes: bytes::Bytes::from_static(b"0123456789"),
            })
            .await
            .unwrap();

        assert_eq!(resp.received_chunk, 0);
        assert_eq!(resp.next_chunk_index, 1);
        assert!(resp.is_complete);
    }

    #[tokio::test]
    async fn put_chunk_replays_idempotently_for_already_received_index() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;
        let cmd = || PutChunkCommand {
            session_id: init.upload_id,
            owner_id: owner(),
            chunk_index: 0,
            client_digest: None,
            bytes: bytes::Bytes::from_static(b"0123456789"),
        };
        svc.put_chunk(cmd()).await.unwrap();
        let replay = svc.put_chunk(cmd()).await.unwrap();
        assert_eq!(replay.next_chunk_index, 1);
        assert!(replay.is_complete);
    }

    #[tokio::test]
    async fn put_chunk_rejects_out_of_order_index() {
        let svc = service(false);
        let init = init_session(&svc, 20 * 1024 * 1024).await;

        let err = svc
            .put_chunk(PutChunkCommand {
                session_id: init.upload_id,
                owner_id: owner(),
                chunk_index: 1,
                client_digest: None,
                bytes: bytes::Bytes::from(vec![0u8; 5 * 1024 * 1024]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Ordering(_)));
    }

    #[tokio::test]
    async fn put_chunk_rejects_checksum_mismatch() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;

        let err = svc
            .put_chunk(PutChunkCommand {
                session_id: init.upload_id,
                owner_id: owner(),
                chunk_index: 0,
                client_digest: Some("not-a-real-digest".into()),
                bytes: bytes::Bytes::from_static(b"0123456789"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Integrity(_)));
    }

    #[tokio::test]
    async fn finalize_completes_session_and_is_idempotent_on_replay() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;
        svc.put_chunk(PutChunkCommand {
            session_id: init.upload_id,
            owner_id: owner(),
            chunk_index: 0,
            client_digest: None,
            bytes: bytes::Bytes::from_static(b"0123456789"),
        })
        .await
        .unwrap();

        let first = svc
            .finalize(FinalizeCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap();

        let second = svc
            .finalize(FinalizeCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap();

        assert_eq!(first.file_id, second.file_id);
        assert_eq!(first.completed_at, second.completed_at);
    }

    #[tokio::test]
    async fn finalize_rejects_incomplete_chunk_set() {
        let svc = service(false);
        let init = init_session(&svc, 20 * 1024 * 1024).await;

        let err = svc
            .finalize(FinalizeCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::State(_)));
    }

    #[tokio::test]
    async fn finalize_failure_marks_session_failed_and_retains_scratch() {
        let svc = service(true);
        let init = init_session(&svc, 10).await;
        svc.put_chunk(PutChunkCommand {
            session_id: init.upload_id,
            owner_id: owner(),
            chunk_index: 0,
            client_digest: None,
            bytes: bytes::Bytes::from_static(b"0123456789"),
        })
        .await
        .unwrap();

        let err = svc
            .finalize(FinalizeCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Infrastructure(_)));

        let status = svc
            .status(StatusQuery {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap();
        assert_eq!(status.status, SessionStatus::Failed);
    }

    #[tokio::test]
    async fn abort_is_idempotent_on_already_aborted_session() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;

        svc.abort(AbortCommand {
            session_id: init.upload_id,
            owner_id: owner(),
        })
        .await
        .unwrap();

        let second = svc
            .abort(AbortCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap();
        assert_eq!(second.status, "aborted");
    }

    #[tokio::test]
    async fn abort_rejects_already_completed_session() {
        let svc = service(false);
        let init = init_session(&svc, 10).await;
        svc.put_chunk(PutChunkCommand {
            session_id: init.upload_id,
            owner_id: owner(),
            chunk_index: 0,
            client_digest: None,
            bytes: bytes::Bytes::from_static(b"0123456789"),
        })
        .await
        .unwrap();
        svc.finalize(FinalizeCommand {
            session_id: init.upload_id,
            owner_id: owner(),
        })
        .await
        .unwrap();

        let err = svc
            .abort(AbortCommand {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::State(_)));
    }

    #[tokio::test]
    async fn status_rejects_a_session_with_corrupt_received_chunks() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let svc = SessionService::new(
            metadata.clone(),
            Arc::new(InMemoryScratchStore::new()),
            Arc::new(StubMaterializer { fail: false }),
            UploadPolicy::default(),
            "artifact-store".into(),
        );
        let init = init_session(&svc, 10).await;

        // corrupt the stored row directly, bypassing advance_progress
        {
            let mut sessions = metadata.sessions.lock().unwrap();
            let session = sessions.get_mut(&init.upload_id).unwrap();
            session.received_chunks = session.total_chunks + 1;
        }

        let err = svc
            .status(StatusQuery {
                session_id: init.upload_id,
                owner_id: owner(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Infrastructure(_)));
    }
}
