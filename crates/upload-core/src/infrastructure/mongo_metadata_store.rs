// crates/upload-core/src/infrastructure/mongo_metadata_store.rs
//
// MongoDB-backed MetadataStore (spec §4.4). Follows the document-mapping
// convention used elsewhere in this stack: plain structs convert to/from
// `bson::Document` via `From`/`TryFrom`, and the client is created once and
// shared behind a `OnceCell`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use shared::{FileId, OwnerId, SessionId, SessionStatus, StorageStrategy};
use tokio::sync::OnceCell;

use crate::domain::{ChunkRecord, FileRecord, UploadSession};
use crate::features::session::error::{PortResult, SessionError};
use crate::features::session::ports::MetadataStore;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Lazily connects on first use and reuses the same `Client` afterwards,
/// mirroring the factory pattern used for this stack's other Mongo-backed
/// stores.
pub struct MongoMetadataStore {
    config: MongoConfig,
    client: OnceCell<Client>,
}

impl MongoMetadataStore {
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn database(&self) -> PortResult<Database> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let options = ClientOptions::parse(&self.config.uri)
                    .await
                    .map_err(|e| SessionError::Infrastructure(format!("parsing mongo uri: {e}")))?;
                Client::with_options(options)
                    .map_err(|e| SessionError::Infrastructure(format!("building mongo client: {e}")))
            })
            .await?;
        Ok(client.database(&self.config.database))
    }

    async fn sessions(&self) -> PortResult<Collection<SessionDocument>> {
        Ok(self.database().await?.collection("uploads"))
    }

    async fn chunks(&self) -> PortResult<Collection<ChunkDocument>> {
        Ok(self.database().await?.collection("upload_chunks"))
    }

    async fn files(&self) -> PortResult<Collection<FileDocument>> {
        Ok(self.database().await?.collection("files"))
    }
}

#[async_trait]
impl MetadataStore for MongoMetadataStore {
    async fn create_session(&self, session: &UploadSession) -> PortResult<()> {
        let doc = SessionDocument::from(session);
        self.sessions()
            .await?
            .insert_one(doc)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("inserting session: {e}")))?;
        Ok(())
    }

    async fn get_session(
        &self,
        session_id: SessionId,
        owner_id: &OwnerId,
    ) -> PortResult<Option<UploadSession>> {
        let found = self
            .sessions()
            .await?
            .find_one(doc! { "_id": session_id.to_string(), "owner_id": &owner_id.0 })
            .await
            .map_err(|e| SessionError::Infrastructure(format!("loading session: {e}")))?;
        found
            .map(UploadSession::try_from)
            .transpose()
            .map_err(SessionError::Infrastructure)
    }

    async fn update_session_status(
        &self,
        session_id: SessionId,
        new_status: SessionStatus,
        error_message: Option<String>,
    ) -> PortResult<()> {
        self.sessions()
            .await?
            .update_one(
                doc! { "_id": session_id.to_string() },
                doc! { "$set": {
                    "status": status_to_str(new_status),
                    "error_message": error_message,
                    "updated_at": BsonDateTime::from_chrono(Utc::now()),
                } },
            )
            .await
            .map_err(|e| SessionError::Infrastructure(format!("updating session status: {e}")))?;
        Ok(())
    }

    async fn record_chunk(&self, chunk: &ChunkRecord) -> PortResult<()> {
        let doc = ChunkDocument::from(chunk);
        self.chunks()
            .await?
            .update_one(
                doc! { "session_id": chunk.session_id.to_string(), "chunk_index": chunk.chunk_index as i64 },
                doc! { "$set": mongodb::bson::to_document(&doc)
                    .map_err(|e| SessionError::Infrastructure(format!("encoding chunk: {e}")))? },
            )
            .upsert(true)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("recording chunk: {e}")))?;
        Ok(())
    }

    async fn advance_progress(
        &self,
        session_id: SessionId,
        expected_index: u32,
        chunk_bytes: u64,
    ) -> PortResult<bool> {
        let filter = doc! {
            "_id": session_id.to_string(),
            "received_chunks": expected_index as i64,
            "status": { "$in": ["pending", "in_progress"] },
        };
        let update = doc! {
            "$inc": { "received_chunks": 1i64, "received_bytes": chunk_bytes as i64 },
            "$set": { "updated_at": BsonDateTime::from_chrono(Utc::now()) },
        };
        let result = self
            .sessions()
            .await?
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("advancing progress: {e}")))?;
        Ok(result.is_some())
    }

    async fn list_chunks(&self, session_id: SessionId) -> PortResult<Vec<ChunkRecord>> {
        use futures::TryStreamExt;
        let mut cursor = self
            .chunks()
            .await?
            .find(doc! { "session_id": session_id.to_string() })
            .await
            .map_err(|e| SessionError::Infrastructure(format!("listing chunks: {e}")))?;
        let mut out = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| SessionError::Infrastructure(format!("reading chunk cursor: {e}")))?
        {
            out.push(ChunkRecord::try_from(doc).map_err(SessionError::Infrastructure)?);
        }
        Ok(out)
    }

    async fn reset_chunks(&self, session_id: SessionId) -> PortResult<()> {
        self.chunks()
            .await?
            .delete_many(doc! { "session_id": session_id.to_string() })
            .await
            .map_err(|e| SessionError::Infrastructure(format!("resetting chunks: {e}")))?;
        Ok(())
    }

    async fn set_manifest_path(&self, session_id: SessionId, path: &str) -> PortResult<()> {
        self.sessions()
            .await?
            .update_one(
                doc! { "_id": session_id.to_string() },
                doc! { "$set": { "manifest_path": path } },
            )
            .await
            .map_err(|e| SessionError::Infrastructure(format!("setting manifest path: {e}")))?;
        Ok(())
    }

    async fn link_file(&self, session_id: SessionId, file_id: FileId) -> PortResult<()> {
        self.sessions()
            .await?
            .update_one(
                doc! { "_id": session_id.to_string() },
                doc! { "$set": {
                    "status": status_to_str(SessionStatus::Completed),
                    "final_file_id": file_id.to_string(),
                    "completed_at": BsonDateTime::from_chrono(Utc::now()),
                    "updated_at": BsonDateTime::from_chrono(Utc::now()),
                } },
            )
            .await
            .map_err(|e| SessionError::Infrastructure(format!("linking file: {e}")))?;
        Ok(())
    }

    async fn insert_file_record(&self, record: &FileRecord) -> PortResult<()> {
        let doc = FileDocument::from(record);
        self.files()
            .await?
            .insert_one(doc)
            .await
            .map_err(|e| SessionError::Infrastructure(format!("inserting file record: {e}")))?;
        Ok(())
    }

    async fn reclaim_expired(&self, cutoff: DateTime<Utc>) -> PortResult<Vec<SessionId>> {
        use futures::TryStreamExt;
        let mut cursor = self
            .sessions()
            .await?
            .find(doc! {
                "status": { "$in": ["pending", "in_progress"] },
                "expires_at": { "$lt": BsonDateTime::from_chrono(cutoff) },
            })
            .await
            .map_err(|e| SessionError::Infrastructure(format!("querying expired sessions: {e}")))?;
        let mut out = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| SessionError::Infrastructure(format!("reading expired cursor: {e}")))?
        {
            let id = SessionId::parse(&doc.id)
                .map_err(|e| SessionError::Infrastructure(format!("parsing session id: {e}")))?;
            out.push(id);
        }
        Ok(out)
    }
}

fn status_to_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Pending => "pending",
        SessionStatus::InProgress => "in_progress",
        SessionStatus::Processing => "processing",
        SessionStatus::Completed => "completed",
        SessionStatus::Aborted => "aborted",
        SessionStatus::Failed => "failed",
    }
}

fn status_from_str(s: &str) -> Result<SessionStatus, String> {
    match s {
        "pending" => Ok(SessionStatus::Pending),
        "in_progress" => Ok(SessionStatus::InProgress),
        "processing" => Ok(SessionStatus::Processing),
        "completed" => Ok(SessionStatus::Completed),
        "aborted" => Ok(SessionStatus::Aborted),
        "failed" => Ok(SessionStatus::Failed),
        other => Err(format!("unknown session status {other}")),
    }
}

fn strategy_to_str(strategy: StorageStrategy) -> &'static str {
    match strategy {
        StorageStrategy::RepoChunks => "repo-chunks",
        StorageStrategy::ReleaseAsset => "release-asset",
        StorageStrategy::InlineBlob => "inline-blob",
        StorageStrategy::GitLfs => "git-lfs",
    }
}

fn strategy_from_str(s: &str) -> Result<StorageStrategy, String> {
    match s {
        "repo-chunks" => Ok(StorageStrategy::RepoChunks),
        "release-asset" => Ok(StorageStrategy::ReleaseAsset),
        "inline-blob" => Ok(StorageStrategy::InlineBlob),
        "git-lfs" => Ok(StorageStrategy::GitLfs),
        other => Err(format!("unknown storage strategy {other}")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    owner_id: String,
    file_name: String,
    declared_size: i64,
    mime_hint: Option<String>,
    target_path: String,
    chunk_size: i64,
    total_chunks: i64,
    strategy: String,
    target_repository: String,
    expires_at: BsonDateTime,
    created_at: BsonDateTime,
    status: String,
    received_chunks: i64,
    received_bytes: i64,
    error_message: Option<String>,
    manifest_path: Option<String>,
    final_blob_path: Option<String>,
    final_file_id: Option<String>,
    completed_at: Option<BsonDateTime>,
    updated_at: BsonDateTime,
}

impl From<&UploadSession> for SessionDocument {
    fn from(s: &UploadSession) -> Self {
        Self {
            id: s.id.to_string(),
            owner_id: s.owner_id.0.clone(),
            file_name: s.file_name.clone(),
            declared_size: s.declared_size as i64,
            mime_hint: s.mime_hint.clone(),
            target_path: s.target_path.clone(),
            chunk_size: s.chunk_size as i64,
            total_chunks: s.total_chunks as i64,
            strategy: strategy_to_str(s.strategy).to_string(),
            target_repository: s.target_repository.clone(),
            expires_at: BsonDateTime::from_chrono(s.expires_at),
            created_at: BsonDateTime::from_chrono(s.created_at),
            status: status_to_str(s.status).to_string(),
            received_chunks: s.received_chunks as i64,
            received_bytes: s.received_bytes as i64,
            error_message: s.error_message.clone(),
            manifest_path: s.manifest_path.clone(),
            final_blob_path: s.final_blob_path.clone(),
            final_file_id: s.final_file_id.map(|id| id.to_string()),
            completed_at: s.completed_at.map(BsonDateTime::from_chrono),
            updated_at: BsonDateTime::from_chrono(s.updated_at),
        }
    }
}

impl TryFrom<SessionDocument> for UploadSession {
    type Error = String;

    fn try_from(d: SessionDocument) -> Result<Self, Self::Error> {
        Ok(UploadSession {
            id: SessionId::parse(&d.id).map_err(|e| e.to_string())?,
            owner_id: OwnerId(d.owner_id),
            file_name: d.file_name,
            declared_size: d.declared_size as u64,
            mime_hint: d.mime_hint,
            target_path: d.target_path,
            chunk_size: d.chunk_size as u64,
            total_chunks: d.total_chunks as u32,
            strategy: strategy_from_str(&d.strategy)?,
            target_repository: d.target_repository,
            expires_at: d.expires_at.into(),
            created_at: d.created_at.into(),
            status: status_from_str(&d.status)?,
            received_chunks: d.received_chunks as u32,
            received_bytes: d.received_bytes as u64,
            error_message: d.error_message,
            manifest_path: d.manifest_path,
            final_blob_path: d.final_blob_path,
            final_file_id: d
                .final_file_id
                .map(|id| FileId::parse(&id))
                .transpose()
                .map_err(|e| e.to_string())?,
            completed_at: d.completed_at.map(Into::into),
            updated_at: d.updated_at.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChunkDocument {
    session_id: String,
    chunk_index: i64,
    size_bytes: i64,
    client_digest: Option<String>,
    server_digest: String,
    scratch_path: String,
    received_at: BsonDateTime,
}

impl From<&ChunkRecord> for ChunkDocument {
    fn from(c: &ChunkRecord) -> Self {
        Self {
            session_id: c.session_id.to_string(),
            chunk_index: c.chunk_index as i64,
            size_bytes: c.size_bytes as i64,
            client_digest: c.client_digest.clone(),
            server_digest: c.server_digest.clone(),
            scratch_path: c.scratch_path.clone(),
            received_at: BsonDateTime::from_chrono(c.received_at),
        }
    }
}

impl TryFrom<ChunkDocument> for ChunkRecord {
    type Error = String;

    fn try_from(d: ChunkDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: SessionId::parse(&d.session_id).map_err(|e| e.to_string())?,
            chunk_index: d.chunk_index as u32,
            size_bytes: d.size_bytes as u64,
            client_digest: d.client_digest,
            server_digest: d.server_digest,
            scratch_path: d.scratch_path,
            received_at: d.received_at.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileDocument {
    #[serde(rename = "_id")]
    id: String,
    owner_id: String,
    display_name: String,
    logical_path: String,
    remote_repository: String,
    remote_blob_ref: String,
    strategy: String,
    strategy_metadata: Bson,
    size_bytes: i64,
    created_at: BsonDateTime,
}

impl From<&FileRecord> for FileDocument {
    fn from(r: &FileRecord) -> Self {
        Self {
            id: r.id.to_string(),
            owner_id: r.owner_id.0.clone(),
            display_name: r.display_name.clone(),
            logical_path: r.logical_path.clone(),
            remote_repository: r.remote_repository.clone(),
            remote_blob_ref: r.remote_blob_ref.clone(),
            strategy: strategy_to_str(r.strategy).to_string(),
            strategy_metadata: mongodb::bson::to_bson(&r.strategy_metadata)
                .unwrap_or(Bson::Null),
            size_bytes: r.size_bytes as i64,
            created_at: BsonDateTime::from_chrono(r.created_at),
        }
    }
}
