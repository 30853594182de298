//! Asset fetching.
//!
//! A `Fetcher` downloads one asset under the process-wide `DownloadPool`,
//! retries transient failures with linear backoff, fixes the file
//! extension from the sniffed content and optionally converts to GIF.

mod config;
mod download;
mod pool;
mod types;

pub use config::FetcherConfig;
pub use download::Fetcher;
pub use pool::{DownloadPool, PoolSlot};
pub use types::{AssetRef, FetchResult, OutputFormat};
