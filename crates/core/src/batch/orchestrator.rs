//! Fan-out of one sticker set into a single archive.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{info, warn};

use crate::archive::{write_archive, ArchiveEntry};
use crate::fetcher::{FetchResult, Fetcher};
use crate::metrics;

use super::types::{BatchError, BatchOutcome, BatchSummary, SetRequest};
use super::workspace::Workspace;

/// Runs set requests against a shared `Fetcher`.
#[derive(Clone)]
pub struct BatchOrchestrator {
    fetcher: Fetcher,
}

impl BatchOrchestrator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Downloads every asset of `request` and packages the successes.
    ///
    /// Individual asset failures are reported in the outcome. Only an
    /// invalid set name, an unusable output directory or a failed archive
    /// abort the batch; the workspace is removed in every case.
    pub async fn create_archive(&self, request: &SetRequest) -> Result<BatchOutcome, BatchError> {
        let format = request.output.as_str();
        let result = self.run(request).await;

        let label = if result.is_ok() { "success" } else { "error" };
        metrics::BATCHES_TOTAL
            .with_label_values(&[label, format])
            .inc();

        result
    }

    async fn run(&self, request: &SetRequest) -> Result<BatchOutcome, BatchError> {
        validate_set_name(&request.set_name)?;

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|source| BatchError::Workspace {
                path: request.output_dir.clone(),
                source,
            })?;

        let workspace = Workspace::create(&request.output_dir, &request.set_name)
            .await
            .map_err(|source| BatchError::Workspace {
                path: request.output_dir.clone(),
                source,
            })?;

        metrics::BATCH_ASSETS
            .with_label_values(&[])
            .observe(request.assets.len() as f64);

        let fetches = request.assets.iter().enumerate().map(|(i, asset)| {
            let dest = workspace.asset_path(i + 1);
            let fetcher = &self.fetcher;
            async move { fetcher.fetch_one(asset, &dest, request.output).await }
        });
        let results: Vec<FetchResult> = join_all(fetches).await;

        let summary = BatchSummary::from_results(&results);
        for (i, r) in results.iter().enumerate().filter(|(_, r)| !r.ok) {
            warn!(
                set = %request.set_name,
                position = i + 1,
                asset = %r.asset_id,
                error = r.error.as_deref().unwrap_or("unknown error"),
                "Asset failed"
            );
        }

        let entries = results
            .iter()
            .filter(|r| r.ok)
            .filter_map(|r| r.output_path.clone())
            .map(ArchiveEntry::from_path)
            .collect();

        let archive_path = archive_path_for(&request.output_dir, &request.set_name, workspace.token());
        let archive = write_archive(entries, &archive_path).await?;
        metrics::ARCHIVE_BYTES
            .with_label_values(&[])
            .observe(archive.size_bytes as f64);

        drop(workspace);

        info!(
            set = %request.set_name,
            ok = summary.ok,
            failed = summary.failed,
            converted = summary.converted,
            format = %request.output,
            archive = %archive.path.display(),
            "Sticker set archived"
        );

        Ok(BatchOutcome {
            archive_path: archive.path,
            archive_size_bytes: archive.size_bytes,
            summary,
            results,
        })
    }
}

/// `{output_dir}/{set_name}_{token}.zip`
pub fn archive_path_for(output_dir: &Path, set_name: &str, token: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.zip", set_name, token))
}

/// Rejects names that could escape the output directory.
pub fn validate_set_name(name: &str) -> Result<(), BatchError> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name == "." || name == ".." {
        Some("must not be a relative path component")
    } else if name.contains('/') || name.contains('\\') {
        Some("must not contain path separators")
    } else if name.chars().any(|c| c.is_control()) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BatchError::InvalidSetName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
