//! Types for the batch module.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::fetcher::{AssetRef, FetchResult, OutputFormat};
use crate::source::StickerSet;

/// One request to package a sticker set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub set_name: String,
    /// Assets in set order.
    pub assets: Vec<AssetRef>,
    pub output: OutputFormat,
    pub output_dir: PathBuf,
}

impl SetRequest {
    /// Builds a request covering every sticker of `set`.
    pub fn from_set(set: &StickerSet, output: OutputFormat, output_dir: PathBuf) -> Self {
        Self {
            set_name: set.name.clone(),
            assets: set
                .stickers
                .iter()
                .map(|s| AssetRef::new(s.file_id.clone()))
                .collect(),
            output,
            output_dir,
        }
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub converted: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[FetchResult]) -> Self {
        let ok = results.iter().filter(|r| r.ok).count();
        Self {
            total: results.len(),
            ok,
            failed: results.len() - ok,
            converted: results.iter().filter(|r| r.converted).count(),
        }
    }
}

/// A failed asset, by 1-based position in the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFailure {
    pub position: usize,
    pub asset_id: String,
    pub error: String,
}

/// Result of a completed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub archive_path: PathBuf,
    pub archive_size_bytes: u64,
    pub summary: BatchSummary,
    /// One result per requested asset, in set order.
    pub results: Vec<FetchResult>,
}

impl BatchOutcome {
    pub fn failures(&self) -> Vec<AssetFailure> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.ok)
            .map(|(i, r)| AssetFailure {
                position: i + 1,
                asset_id: r.asset_id.clone(),
                error: r.error.clone().unwrap_or_default(),
            })
            .collect()
    }
}

/// Structural failures of a batch. Per-asset problems are never errors.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid set name {name:?}: {reason}")]
    InvalidSetName { name: String, reason: &'static str },

    #[error("Failed to prepare workspace under {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build archive: {0}")]
    Archive(#[from] ArchiveError),
}
