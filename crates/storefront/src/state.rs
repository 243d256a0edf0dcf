//! Application state shared across handlers.

use std::sync::Arc;

use bejaus_core::checkout::PaymentProcessor;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::models::InFlightCheckouts;
use crate::services::{MailerLiteClient, MailerLiteError, YouTubeClient, YouTubeError};
use crate::square::{SimulatedProcessor, SquareClient, SquareError};

/// Error building a third-party client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("square client: {0}")]
    Square(#[from] SquareError),
    #[error("mailerlite client: {0}")]
    MailerLite(#[from] MailerLiteError),
    #[error("youtube client: {0}")]
    YouTube(#[from] YouTubeError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the catalog, the external service clients and the
/// registry of checkouts in flight.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    payments: Arc<dyn PaymentProcessor>,
    square: Option<SquareClient>,
    mailerlite: Option<MailerLiteClient>,
    youtube: Option<YouTubeClient>,
    in_flight: Arc<InFlightCheckouts>,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Payments go through Square when an access token is configured and
    /// through the [`SimulatedProcessor`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let square = config
            .square
            .access_token
            .as_ref()
            .map(|token| SquareClient::new(&config.square, token))
            .transpose()?;

        let payments: Arc<dyn PaymentProcessor> = match &square {
            Some(client) => Arc::new(client.clone()),
            None => {
                tracing::warn!("SQUARE_ACCESS_TOKEN not set, payments are simulated");
                Arc::new(SimulatedProcessor::new(config.square.simulated_delay))
            }
        };

        Self::build(config, Catalog::default(), square, payments)
    }

    /// Create the application state with a specific payment processor.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built.
    pub fn with_payment_processor(
        config: StorefrontConfig,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, StateError> {
        Self::build(config, Catalog::default(), None, payments)
    }

    /// Create the application state serving `catalog` instead of the house
    /// product range.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built.
    pub fn with_catalog(
        config: StorefrontConfig,
        catalog: Catalog,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, StateError> {
        Self::build(config, catalog, None, payments)
    }

    fn build(
        config: StorefrontConfig,
        catalog: Catalog,
        square: Option<SquareClient>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, StateError> {
        let mailerlite = config
            .mailerlite
            .as_ref()
            .map(MailerLiteClient::new)
            .transpose()?;
        let youtube = config
            .youtube
            .as_ref()
            .map(YouTubeClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                payments,
                square,
                mailerlite,
                youtube,
                in_flight: Arc::new(InFlightCheckouts::default()),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the payment processor checkouts are submitted to.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentProcessor {
        self.inner.payments.as_ref()
    }

    /// Get the Square client, if an access token is configured.
    #[must_use]
    pub fn square(&self) -> Option<&SquareClient> {
        self.inner.square.as_ref()
    }

    /// Get the `MailerLite` client, if configured.
    #[must_use]
    pub fn mailerlite(&self) -> Option<&MailerLiteClient> {
        self.inner.mailerlite.as_ref()
    }

    /// Get the YouTube client, if configured.
    #[must_use]
    pub fn youtube(&self) -> Option<&YouTubeClient> {
        self.inner.youtube.as_ref()
    }

    /// Get the registry of sessions with a checkout in flight.
    #[must_use]
    pub fn in_flight(&self) -> &Arc<InFlightCheckouts> {
        &self.inner.in_flight
    }
}
