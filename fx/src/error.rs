//! FX error types.

use reqwest::StatusCode;
use thiserror::Error;
use voyage_common::CurrencyPair;

/// Errors that can occur while fetching or resolving exchange rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rate not available for the requested currency pair.
    #[error("Rate not available for {0}")]
    RateNotAvailable(CurrencyPair),

    /// Transport-level failure talking to the rate provider.
    #[error("Rate provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("Rate provider returned status {0}")]
    UnexpectedStatus(StatusCode),

    /// Provider answered with a body we could not use.
    #[error("Malformed rate payload: {0}")]
    MalformedPayload(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
