//! Download handlers: single image, batch archive, in-flight listing.

use super::{DownloadBatchRequest, DownloadImageRequest};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{BatchReport, DownloadingEntry, SavedFile};
use axum::{Json, extract::State, http::StatusCode};

/// POST /downloads/image - Download one image
pub async fn download_image(
    State(state): State<AppState>,
    Json(request): Json<DownloadImageRequest>,
) -> Result<(StatusCode, Json<SavedFile>)> {
    let saved = state
        .downloader
        .download_image(&request.url, &request.filename)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// POST /downloads/batch - Download several images into one archive
pub async fn download_batch(
    State(state): State<AppState>,
    Json(request): Json<DownloadBatchRequest>,
) -> Result<(StatusCode, Json<BatchReport>)> {
    let report = state
        .downloader
        .download_images(&request.urls, &request.label)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /downloads/active - List in-flight downloads, oldest first
pub async fn list_active(State(state): State<AppState>) -> Json<Vec<DownloadingEntry>> {
    Json(state.downloader.registry().active())
}
