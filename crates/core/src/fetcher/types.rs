//! Types for the fetcher module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque reference to one remote asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: String,
}

impl AssetRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// What to produce for each asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the downloaded file as is (after relabelling).
    #[default]
    Native,
    /// Transcode raster and video assets to GIF.
    Gif,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of fetching one asset. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub asset_id: String,
    pub ok: bool,
    pub converted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Download attempts made.
    pub attempts: u32,
}

impl FetchResult {
    pub fn success(asset_id: &str, path: PathBuf, converted: bool, attempts: u32) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            ok: true,
            converted,
            error: None,
            output_path: Some(path),
            attempts,
        }
    }

    pub fn failure(asset_id: &str, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            ok: false,
            converted: false,
            error: Some(error.into()),
            output_path: None,
            attempts,
        }
    }
}
