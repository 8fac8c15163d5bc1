//! CLI commands implementation

pub mod ask;
pub mod ingest;
pub mod init;
pub mod remove;
pub mod status;

pub use ask::*;
pub use ingest::*;
pub use init::*;
pub use remove::*;
pub use status::*;
