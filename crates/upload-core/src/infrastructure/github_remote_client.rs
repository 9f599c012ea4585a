// crates/upload-core/src/infrastructure/github_remote_client.rs
//
// RemoteClient adapter against a GitHub-contents/releases-shaped API
// (spec §4.7). HTTP status codes are classified into `RemoteError` variants
// here, once, so every call site downstream gets explicit result types
// instead of re-deriving retriability from a status code.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::features::materialize::error::RemoteError;
use crate::features::materialize::ports::RemoteClient;

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_base_url: String,
    pub uploads_base_url: String,
    pub owner: String,
    pub token: String,
}

pub struct GithubRemoteClient {
    http: Client,
    config: GithubConfig,
}

impl GithubRemoteClient {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn classify(status: StatusCode, body: &str) -> RemoteError {
        match status {
            StatusCode::NOT_FOUND => RemoteError::NotFound(body.to_string()),
            StatusCode::UNPROCESSABLE_ENTITY => RemoteError::Unprocessable(body.to_string()),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                RemoteError::RateLimited { retry_after_secs: 30 }
            }
            s if s.is_server_error() => RemoteError::Transient(format!("{status}: {body}")),
            _ => RemoteError::Permanent(format!("{status}: {body}")),
        }
    }

    async fn existing_sha(&self, repo: &str, path: &str) -> Result<Option<String>, RemoteError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url, self.config.owner, repo, path
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }
        let parsed: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Permanent(format!("decoding contents response: {e}")))?;
        Ok(Some(parsed.sha))
    }
}

#[async_trait]
impl RemoteClient for GithubRemoteClient {
    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        commit_message: &str,
        bytes: Bytes,
    ) -> Result<String, RemoteError> {
        let sha = self.existing_sha(repo, path).await?;
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url, self.config.owner, repo, path
        );
        let payload = PutFileRequest {
            message: commit_message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(&bytes),
            sha,
        };
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }
        let parsed: PutFileResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Permanent(format!("decoding put_file response: {e}")))?;
        Ok(parsed.content.sha)
    }

    async fn delete_path(&self, repo: &str, path: &str, commit_message: &str) -> Result<(), RemoteError> {
        let Some(sha) = self.existing_sha(repo, path).await? else {
            return Ok(());
        };
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url, self.config.owner, repo, path
        );
        let resp = self
            .http
            .delete(&url)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "message": commit_message, "sha": sha }))
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }
        Ok(())
    }

    async fn ensure_release(
        &self,
        repo: &str,
        tag: &str,
        name: &str,
        body: &str,
    ) -> Result<String, RemoteError> {
        let get_url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.config.api_base_url, self.config.owner, repo, tag
        );
        let resp = self
            .http
            .get(&get_url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        if resp.status().is_success() {
            let release: ReleaseResponse = resp
                .json()
                .await
                .map_err(|e| RemoteError::Permanent(format!("decoding release response: {e}")))?;
            return Ok(release.id.to_string());
        }
        if resp.status() != StatusCode::NOT_FOUND {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &err_body));
        }

        let create_url = format!(
            "{}/repos/{}/{}/releases",
            self.config.api_base_url, self.config.owner, repo
        );
        let resp = self
            .http
            .post(&create_url)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({
                "tag_name": tag,
                "name": name,
                "body": body,
                "draft": false,
                "prerelease": false,
            }))
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }
        let release: ReleaseResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Permanent(format!("decoding release response: {e}")))?;
        Ok(release.id.to_string())
    }

    async fn upload_release_asset(
        &self,
        repo: &str,
        release_id: &str,
        asset_name: &str,
        content_type: &str,
        local_file: &Path,
    ) -> Result<String, RemoteError> {
        let bytes = tokio::fs::read(local_file)
            .await
            .map_err(|e| RemoteError::Permanent(format!("reading assembled file: {e}")))?;
        let url = format!(
            "{}/repos/{}/{}/releases/{}/assets?name={}",
            self.config.uploads_base_url, self.config.owner, repo, release_id, asset_name
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }
        let parsed: AssetResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Permanent(format!("decoding asset response: {e}")))?;
        Ok(parsed.id.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutFileRequest {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutFileResponse {
    content: ContentsResponse,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    id: u64,
}
