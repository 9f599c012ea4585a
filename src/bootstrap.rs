//! Composition root: wires adapters into ports and assembles the
//! `SessionService` the handlers depend on.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use upload_core::infrastructure::{FsScratchStore, GithubConfig, GithubRemoteClient, MongoConfig, MongoMetadataStore};
use upload_core::{RemoteMaterializer, RetryPolicy, SessionService, UploadPolicy};

use crate::app_state::AppState;
use crate::config::Config;

pub async fn bootstrap(config: &Config) -> Result<AppState, String> {
    let metadata_store = Arc::new(MongoMetadataStore::new(MongoConfig {
        uri: config.database.uri.clone(),
        database: config.database.database.clone(),
    }));

    let scratch_base = PathBuf::from(&config.scratch.base_dir);
    tokio::fs::create_dir_all(&scratch_base)
        .await
        .map_err(|e| format!("creating scratch base dir: {e}"))?;
    let scratch_store = Arc::new(FsScratchStore::new(scratch_base.clone()));

    let remote_client = Arc::new(GithubRemoteClient::new(GithubConfig {
        api_base_url: config.remote.api_base_url.clone(),
        uploads_base_url: config.remote.uploads_base_url.clone(),
        owner: config.remote.owner.clone(),
        token: config.remote.token.clone(),
    }));

    let assemble_dir = scratch_base.join("_assembly");
    tokio::fs::create_dir_all(&assemble_dir)
        .await
        .map_err(|e| format!("creating assembly dir: {e}"))?;

    let materializer = Arc::new(RemoteMaterializer::new(
        remote_client,
        RetryPolicy {
            base_delay: Duration::from_millis(config.remote.retry_base_delay_ms),
            max_attempts: config.remote.retry_max_attempts,
        },
        assemble_dir,
    ));

    let policy = UploadPolicy {
        default_chunk_size: config.upload_policy.default_chunk_size,
        min_chunk_size: config.upload_policy.min_chunk_size,
        max_chunk_size: config.upload_policy.max_chunk_size,
        max_upload_size: config.upload_policy.max_upload_size,
        release_assets_enabled: config.upload_policy.release_assets_enabled,
        release_max_bytes: config.upload_policy.release_max_bytes,
        git_lfs_enabled: config.upload_policy.git_lfs_enabled,
        lfs_threshold_bytes: config.upload_policy.lfs_threshold_bytes,
        session_ttl_hours: config.upload_policy.session_ttl_hours,
    };

    let session_service = Arc::new(SessionService::new(
        metadata_store,
        scratch_store,
        materializer,
        policy,
        config.remote.default_repository.clone(),
    ));

    Ok(AppState {
        session_service,
        service_credential: config.server.service_credential.clone(),
    })
}
