//! Channel video listing.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::VideoFeed;
use crate::state::AppState;

/// Latest upload and the most watched recent ones.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<VideoFeed>> {
    let client = state
        .youtube()
        .ok_or(AppError::NotConfigured("The video listing"))?;
    let feed = client.feed().await?;
    Ok(Json((*feed).clone()))
}
