//! Per-attempt checkout state machine.

use serde::{Deserialize, Serialize};

use super::boundary::{PaymentConfirmation, PaymentToken, TokenizeError};
use super::error::CheckoutError;

/// How a settled attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Settlement {
    Succeeded,
    Failed,
}

/// Where an attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Tokenizing,
    Submitting,
    Settled(Settlement),
}

/// State of one checkout attempt.
///
/// Transitions are guarded by phase checks only; there is a single logical
/// thread of control per attempt. Serializable so a server can keep it in a
/// visitor's session and refuse a second submission while one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    phase: CheckoutPhase,
}

impl CheckoutAttempt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Whether tokenizing or submitting is under way.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self.phase,
            CheckoutPhase::Tokenizing | CheckoutPhase::Submitting
        )
    }

    /// The user pressed pay.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InProgress`] while tokenizing or submitting, and
    /// [`CheckoutError::AlreadyCompleted`] once the attempt has succeeded.
    pub fn begin(&mut self) -> Result<(), CheckoutError> {
        match self.phase {
            CheckoutPhase::Idle | CheckoutPhase::Settled(Settlement::Failed) => {
                self.phase = CheckoutPhase::Tokenizing;
                Ok(())
            }
            CheckoutPhase::Tokenizing | CheckoutPhase::Submitting => Err(CheckoutError::InProgress),
            CheckoutPhase::Settled(Settlement::Succeeded) => Err(CheckoutError::AlreadyCompleted),
        }
    }

    /// Record the tokenization outcome.
    ///
    /// A token moves the attempt to `Submitting`; a widget error settles it
    /// as failed without submitting anything.
    ///
    /// # Errors
    ///
    /// The tokenization error, or [`CheckoutError::OutOfOrder`] if the attempt
    /// was not tokenizing.
    pub fn tokenized(
        &mut self,
        result: Result<PaymentToken, TokenizeError>,
    ) -> Result<PaymentToken, CheckoutError> {
        if self.phase != CheckoutPhase::Tokenizing {
            return Err(CheckoutError::OutOfOrder(self.phase));
        }
        match result {
            Ok(token) => {
                self.phase = CheckoutPhase::Submitting;
                Ok(token)
            }
            Err(e) => {
                self.phase = CheckoutPhase::Settled(Settlement::Failed);
                Err(CheckoutError::Tokenization(e))
            }
        }
    }

    /// Settle an in-flight attempt.
    ///
    /// Accepted from `Submitting`, and from `Tokenizing` for failures found
    /// before a token was requested.
    ///
    /// # Errors
    ///
    /// The failure passed in, or [`CheckoutError::OutOfOrder`] if the attempt
    /// was not in flight.
    pub fn settle(
        &mut self,
        result: Result<PaymentConfirmation, CheckoutError>,
    ) -> Result<PaymentConfirmation, CheckoutError> {
        match (self.phase, result) {
            (CheckoutPhase::Submitting, Ok(confirmation)) => {
                self.phase = CheckoutPhase::Settled(Settlement::Succeeded);
                Ok(confirmation)
            }
            (CheckoutPhase::Tokenizing | CheckoutPhase::Submitting, Err(e)) => {
                self.phase = CheckoutPhase::Settled(Settlement::Failed);
                Err(e)
            }
            (phase, _) => Err(CheckoutError::OutOfOrder(phase)),
        }
    }
}
