//! Payment provider error types.

use thiserror::Error;

/// Errors that can occur when talking to the payment provider.
///
/// All variants are retryable from the shopper's point of view: nothing
/// is persisted locally before or during a provider call.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("provider error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Provider-supplied error message.
        message: String,
    },

    /// The provider's response could not be parsed.
    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),
}
