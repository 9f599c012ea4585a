use serde::{Deserialize, Serialize};

/// Session lifecycle status. See spec §4.2 for the legal transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Processing,
    Completed,
    Aborted,
    Failed,
}

impl SessionStatus {
    /// Terminal statuses never transition further (except timestamp bumps).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Aborted | SessionStatus::Failed
        )
    }
}

/// Storage strategy chosen at init time, fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageStrategy {
    RepoChunks,
    ReleaseAsset,
    InlineBlob,
    /// Optional strategy; aliases to `RepoChunks` unless a true LFS writer
    /// is configured (spec §9 Open Questions).
    GitLfs,
}

impl std::fmt::Display for StorageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StorageStrategy::RepoChunks => "repo-chunks",
            StorageStrategy::ReleaseAsset => "release-asset",
            StorageStrategy::InlineBlob => "inline-blob",
            StorageStrategy::GitLfs => "git-lfs",
        };
        write!(f, "{s}")
    }
}
