// crates/upload-core/src/features/materialize/ports.rs

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::RemoteError;

/// Thin capability surface over a GitHub-contents/releases-shaped remote
/// (spec §4.7). Every write is a single logical call; retry/backoff is the
/// caller's concern, not the adapter's.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Creates or updates the file at `path` in `repo`. Returns the remote
    /// content sha.
    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        commit_message: &str,
        bytes: Bytes,
    ) -> Result<String, RemoteError>;

    async fn delete_path(&self, repo: &str, path: &str, commit_message: &str) -> Result<(), RemoteError>;

    /// Creates the release identified by `tag` if it doesn't already exist.
    /// Returns the release id either way.
    async fn ensure_release(
        &self,
        repo: &str,
        tag: &str,
        name: &str,
        body: &str,
    ) -> Result<String, RemoteError>;

    /// Uploads `local_file` as an asset of `release_id`. Returns the asset
    /// id.
    async fn upload_release_asset(
        &self,
        repo: &str,
        release_id: &str,
        asset_name: &str,
        content_type: &str,
        local_file: &Path,
    ) -> Result<String, RemoteError>;
}
