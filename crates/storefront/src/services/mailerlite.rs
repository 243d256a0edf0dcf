//! `MailerLite` API client for newsletter sign-ups.

use bejaus_core::Email;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::MailerLiteConfig;

/// `MailerLite` API base URL.
const BASE_URL: &str = "https://connect.mailerlite.com/api";

/// Errors that can occur when interacting with the `MailerLite` API.
#[derive(Debug, Error)]
pub enum MailerLiteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The address is already on the list.
    #[error("Subscriber already exists")]
    AlreadySubscribed,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A newsletter sign-up.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub name: String,
    pub email: Email,
}

#[derive(Debug, Serialize)]
struct SubscriberBody<'a> {
    email: &'a str,
    fields: SubscriberFields<'a>,
    groups: &'a [String],
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct SubscriberFields<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubscriberEnvelope {
    data: SubscriberRecord,
}

/// Subscriber as stored by `MailerLite`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// `MailerLite` API client.
#[derive(Clone)]
pub struct MailerLiteClient {
    client: reqwest::Client,
    group_ids: Vec<String>,
}

impl MailerLiteClient {
    /// Create a new `MailerLite` API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MailerLiteConfig) -> Result<Self, MailerLiteError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| MailerLiteError::Parse(format!("Invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            group_ids: config.group_ids.clone(),
        })
    }

    /// Add an active subscriber to the configured groups.
    ///
    /// # Errors
    ///
    /// Returns [`MailerLiteError::AlreadySubscribed`] on a 409 and other
    /// variants if the request fails.
    #[instrument(skip(self, subscriber), fields(email_domain = subscriber.email.domain()))]
    pub async fn subscribe(&self, subscriber: &Subscriber) -> Result<SubscriberRecord, MailerLiteError> {
        let url = format!("{BASE_URL}/subscribers");

        let body = SubscriberBody {
            email: subscriber.email.as_str(),
            fields: SubscriberFields {
                name: &subscriber.name,
            },
            groups: &self.group_ids,
            status: "active",
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::CONFLICT {
            return Err(MailerLiteError::AlreadySubscribed);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailerLiteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: SubscriberEnvelope = response
            .json()
            .await
            .map_err(|e| MailerLiteError::Parse(e.to_string()))?;

        Ok(envelope.data)
    }
}
