pub mod chunk;
pub mod file_record;
pub mod manifest;
pub mod session;

pub use chunk::ChunkRecord;
pub use file_record::FileRecord;
pub use manifest::{Manifest, ManifestChunkEntry};
pub use session::UploadSession;
