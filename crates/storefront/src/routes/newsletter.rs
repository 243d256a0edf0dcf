//! Newsletter subscription route handler.

use axum::{Json, extract::State};
use bejaus_core::Email;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::Subscriber;
use crate::state::AppState;

/// Newsletter subscription request body.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Subscribe a visitor to the newsletter.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    let subscriber = validate(&request)?;

    let client = state
        .mailerlite()
        .ok_or(AppError::NotConfigured("The newsletter"))?;

    let record = client.subscribe(&subscriber).await?;
    add_breadcrumb(
        "newsletter",
        "Subscribed",
        Some(&[("domain", subscriber.email.domain())]),
    );
    tracing::info!(subscriber_id = %record.id, "Newsletter subscription created");

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Successfully subscribed to the newsletter!",
    }))
}

fn validate(request: &SubscribeRequest) -> Result<Subscriber> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }
    let email = Email::parse(request.email.trim())
        .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_string()))?;
    Ok(Subscriber {
        name: name.to_string(),
        email,
    })
}
