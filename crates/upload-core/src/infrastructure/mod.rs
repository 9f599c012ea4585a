pub mod github_remote_client;
pub mod mongo_metadata_store;
pub mod scratch_store;

pub use github_remote_client::{GithubConfig, GithubRemoteClient};
pub use mongo_metadata_store::{MongoConfig, MongoMetadataStore};
pub use scratch_store::FsScratchStore;
