//! Batch orchestration.
//!
//! One `SetRequest` becomes one zip: a private workspace is created, every
//! asset is fetched concurrently under the shared download pool, the
//! successes are archived and the workspace is removed.

mod orchestrator;
mod types;
mod workspace;

pub use orchestrator::{archive_path_for, validate_set_name, BatchOrchestrator};
pub use types::{AssetFailure, BatchError, BatchOutcome, BatchSummary, SetRequest};
pub use workspace::{new_token, Workspace, TOKEN_LEN};
