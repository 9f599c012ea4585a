pub mod materialize;
pub mod session;
