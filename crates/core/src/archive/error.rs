//! Error types for the archive module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while packaging a workspace.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An entry to be archived is missing.
    #[error("Archive entry not found: {path}")]
    EntryNotFound { path: PathBuf },

    /// Two entries resolved to the same name inside the archive.
    #[error("Duplicate archive entry name: {name}")]
    DuplicateEntry { name: String },

    /// The zip writer failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking writer task panicked or was cancelled.
    #[error("Archive task failed: {0}")]
    Task(String),

    /// I/O error while reading entries or writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
