mod inline_blob;
mod release_asset;
mod repo_chunks;

pub mod error;
pub mod ports;
pub mod use_case;

pub use error::RemoteError;
pub use ports::RemoteClient;
pub use use_case::{RemoteMaterializer, RetryPolicy};
