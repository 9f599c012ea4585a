pub mod domain;
pub mod features;
pub mod infrastructure;

pub use features::materialize::{RemoteClient, RemoteError, RemoteMaterializer, RetryPolicy};
pub use features::session::{SessionError, SessionService, UploadPolicy};
