//! Zip packaging of a finished workspace.

mod error;
mod writer;

pub use error::ArchiveError;
pub use writer::{sort_entries, write_archive, ArchiveEntry, ArchiveInfo};
