// crates/upload-core/src/features/session/strategy.rs
//
// Strategy Selector (spec §4.5): a pure function of declared size and
// configured policy. Never consults the metadata or scratch stores.

use shared::StorageStrategy;

use super::policy::UploadPolicy;

pub fn select_strategy(declared_size: u64, policy: &UploadPolicy) -> StorageStrategy {
    if policy.release_assets_enabled && declared_size <= policy.release_max_bytes {
        StorageStrategy::ReleaseAsset
    } else if policy.git_lfs_enabled && declared_size <= policy.lfs_threshold_bytes {
        StorageStrategy::GitLfs
    } else {
        StorageStrategy::RepoChunks
    }
}

/// Chunk size clamped to `[min_chunk_size, max_chunk_size]`, and never
/// larger than the declared size itself.
pub fn select_chunk_size(declared_size: u64, policy: &UploadPolicy) -> u64 {
    let clamped = policy
        .default_chunk_size
        .clamp(policy.min_chunk_size, policy.max_chunk_size);
    clamped.min(declared_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::total_chunks_for;

    fn policy() -> UploadPolicy {
        UploadPolicy {
            release_assets_enabled: true,
            release_max_bytes: 2 * 1024 * 1024 * 1024,
            git_lfs_enabled: true,
            lfs_threshold_bytes: 100 * 1024 * 1024,
            ..UploadPolicy::default()
        }
    }

    #[test]
    fn picks_release_asset_under_release_max() {
        let p = policy();
        assert_eq!(
            select_strategy(100 * 1024 * 1024, &p),
            StorageStrategy::ReleaseAsset
        );
    }

    #[test]
    fn picks_repo_chunks_above_all_thresholds() {
        let p = policy();
        assert_eq!(
            select_strategy(10 * 1024 * 1024 * 1024, &p),
            StorageStrategy::RepoChunks
        );
    }

    #[test]
    fn chunk_size_never_exceeds_declared_size() {
        let p = policy();
        assert_eq!(select_chunk_size(2 * 1024 * 1024, &p), 2 * 1024 * 1024);
    }

    #[test]
    fn chunk_size_clamped_to_policy_bounds() {
        let mut p = policy();
        p.default_chunk_size = 200 * 1024 * 1024;
        p.max_chunk_size = 50 * 1024 * 1024;
        assert_eq!(select_chunk_size(10 * 1024 * 1024 * 1024, &p), 50 * 1024 * 1024);
    }

    #[test]
    fn misaligned_last_chunk_byte_count() {
        let size = 12_500_000u64;
        let chunk_size = 5 * 1024 * 1024u64;
        let total = total_chunks_for(size, chunk_size);
        assert_eq!(total, 3);
        let last_chunk_size = size - (total as u64 - 1) * chunk_size;
        assert_eq!(last_chunk_size, 2_014_240);
    }
}
