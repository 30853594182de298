//! Sticker set API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use stickerpack_core::{
    AssetFailure, BatchError, BatchSummary, CleanupTarget, MessageRef, OutputFormat, SetRequest,
    SourceError, StickerKind, StickerSet,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Error body returned by every handler in this module.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Sticker counts per encoding.
#[derive(Debug, Serialize)]
pub struct KindCounts {
    #[serde(rename = "static")]
    pub static_count: usize,
    pub animated: usize,
    pub video: usize,
}

#[derive(Debug, Serialize)]
pub struct SetInfoResponse {
    pub name: String,
    pub title: String,
    pub count: usize,
    pub kinds: KindCounts,
}

impl From<&StickerSet> for SetInfoResponse {
    fn from(set: &StickerSet) -> Self {
        Self {
            name: set.name.clone(),
            title: set.title.clone(),
            count: set.stickers.len(),
            kinds: KindCounts {
                static_count: set.count_kind(StickerKind::Static),
                animated: set.count_kind(StickerKind::Animated),
                video: set.count_kind(StickerKind::Video),
            },
        }
    }
}

/// Request body for building an archive
#[derive(Debug, Default, Deserialize)]
pub struct ArchiveBody {
    #[serde(default)]
    pub format: OutputFormat,
    /// Chat to deliver the archive to. Without it the archive stays local.
    #[serde(default)]
    pub chat_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub set_name: String,
    pub format: OutputFormat,
    pub archive_path: PathBuf,
    pub archive_size_bytes: u64,
    pub summary: BatchSummary,
    pub failures: Vec<AssetFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageRef>,
    /// When the archive (and delivered message) will be deleted.
    pub delete_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub invalidated: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Look up a sticker set through the metadata cache
pub async fn get_set(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SetInfoResponse>, ApiError> {
    let set = state
        .cache()
        .get_or_fetch(state.source(), &name)
        .await
        .map_err(source_error)?;
    Ok(Json(SetInfoResponse::from(set.as_ref())))
}

/// Drop a set from the metadata cache
pub async fn invalidate_set(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<InvalidateResponse> {
    Json(InvalidateResponse {
        invalidated: state.cache().invalidate(&name).await,
    })
}

/// Download a whole set, package it and optionally deliver it to a chat
pub async fn create_archive(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<ArchiveBody>,
) -> Result<Json<ArchiveResponse>, ApiError> {
    let set = state
        .cache()
        .get_or_fetch(state.source(), &name)
        .await
        .map_err(source_error)?;

    let request = SetRequest::from_set(
        &set,
        body.format,
        state.config().fetcher.output_dir.clone(),
    );
    let outcome = state
        .orchestrator()
        .create_archive(&request)
        .await
        .map_err(batch_error)?;

    let delay = state.config().cleanup.delete_delay();
    let delete_at = Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    let message = match body.chat_id {
        Some(chat_id) => {
            match state
                .messenger()
                .send_document(chat_id, &outcome.archive_path, &set.title)
                .await
            {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(set = %name, chat_id, error = %e, "Failed to deliver archive");
                    state
                        .cleanup()
                        .schedule(CleanupTarget::file(&outcome.archive_path), delay);
                    return Err(api_error(
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deliver archive: {}", e),
                    ));
                }
            }
        }
        None => None,
    };

    let target = match message {
        Some(message) => CleanupTarget::message_and_file(message, &outcome.archive_path),
        None => CleanupTarget::file(&outcome.archive_path),
    };
    if !state.cleanup().schedule(target, delay) {
        warn!(set = %name, "Cleanup scheduler is shutting down, archive left in place");
    }

    info!(
        set = %name,
        format = %body.format,
        delivered = message.is_some(),
        "Archive request completed"
    );

    Ok(Json(ArchiveResponse {
        set_name: set.name.clone(),
        format: body.format,
        failures: outcome.failures(),
        archive_path: outcome.archive_path,
        archive_size_bytes: outcome.archive_size_bytes,
        summary: outcome.summary,
        message,
        delete_at,
    }))
}

// ============================================================================
// Error mapping
// ============================================================================

fn source_error(e: SourceError) -> ApiError {
    let status = match &e {
        SourceError::NotFound(_) => StatusCode::NOT_FOUND,
        SourceError::Api { status: 400, .. } => StatusCode::NOT_FOUND,
        SourceError::Forbidden(_) => StatusCode::FORBIDDEN,
        SourceError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        SourceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, e)
}

fn batch_error(e: BatchError) -> ApiError {
    let status = match &e {
        BatchError::InvalidSetName { .. } => StatusCode::BAD_REQUEST,
        BatchError::Workspace { .. } | BatchError::Archive(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e)
}
