//! Primitives shared across the upload service's crates: opaque identifiers
//! and the small set of enums that travel across the HTTP boundary.

pub mod enums;
pub mod ids;

pub use enums::{SessionStatus, StorageStrategy};
pub use ids::{FileId, OwnerId, SessionId};
