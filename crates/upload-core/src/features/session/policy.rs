// crates/upload-core/src/features/session/policy.rs
//
// Configuration the Strategy Selector (spec §4.5) is a pure function of.
// Lives in the session feature since `init` is the only operation that
// consults it.

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub default_chunk_size: u64,
    pub min_chunk_size: u64,
    pub max_chunk_size: u64,
    pub max_upload_size: u64,
    pub release_assets_enabled: bool,
    pub release_max_bytes: u64,
    pub git_lfs_enabled: bool,
    pub lfs_threshold_bytes: u64,
    pub session_ttl_hours: i64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            default_chunk_size: 5 * 1024 * 1024,
            min_chunk_size: crate::domain::session::MIN_CHUNK_SIZE,
            max_chunk_size: crate::domain::session::MAX_CHUNK_SIZE,
            max_upload_size: 5 * 1024 * 1024 * 1024,
            release_assets_enabled: false,
            release_max_bytes: 2 * 1024 * 1024 * 1024,
            git_lfs_enabled: false,
            lfs_threshold_bytes: 100 * 1024 * 1024,
            session_ttl_hours: 24,
        }
    }
}
