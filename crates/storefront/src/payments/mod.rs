//! Hosted-checkout payment provider client.
//!
//! # Architecture
//!
//! - The provider hosts the payment page; the storefront only creates a
//!   checkout session and hands the shopper an opaque session id for the
//!   client-side redirect
//! - Form-encoded request/JSON response wire shape (Stripe-compatible)
//! - Sessions are transient: one per checkout attempt, never persisted
//!
//! # Example
//!
//! ```rust,ignore
//! use marigold_storefront::payments::{PaymentsClient, types::CheckoutSessionRequest};
//!
//! let client = PaymentsClient::new(&config.payments);
//! let session = client.create_checkout_session(&request).await?;
//! // session.id drives the shopper's redirect to the hosted page
//! ```

mod error;
pub mod types;

pub use error::PaymentsError;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use crate::config::PaymentsConfig;
use types::{CheckoutSessionRequest, ProviderSession};

/// Error body returned by the provider on failed calls.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Client for the hosted-checkout payment provider.
///
/// Cheaply cloneable; holds the HTTP client and credentials behind an
/// `Arc`.
#[derive(Clone)]
pub struct PaymentsClient {
    inner: Arc<PaymentsClientInner>,
}

struct PaymentsClientInner {
    client: reqwest::Client,
    endpoint: String,
    secret_key: String,
}

impl PaymentsClient {
    /// Create a new payment provider client.
    #[must_use]
    pub fn new(config: &PaymentsConfig) -> Self {
        let endpoint = format!(
            "{}/v1/checkout/sessions",
            config.api_base.trim_end_matches('/')
        );

        Self {
            inner: Arc::new(PaymentsClientInner {
                client: reqwest::Client::new(),
                endpoint,
                secret_key: config.secret_key.expose_secret().to_string(),
            }),
        }
    }

    /// Create a hosted checkout session.
    ///
    /// The session is created on the provider's side only; nothing is
    /// persisted locally, so a failure here leaves no state behind and
    /// the shopper can simply retry.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError::Http` if the request cannot be sent,
    /// `PaymentsError::Api` if the provider rejects it, and
    /// `PaymentsError::Parse` if the response body is not a session.
    #[instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<ProviderSession, PaymentsError> {
        let params = request.form_params();

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(&self.inner.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Payment provider returned non-success status"
            );

            let message = serde_json::from_str::<ApiErrorBody>(&response_text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| "checkout session creation failed".to_string());

            return Err(PaymentsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: ProviderSession = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse checkout session response"
            );
            PaymentsError::Parse(e)
        })?;

        tracing::debug!(session_id = %session.id, "Checkout session created");

        Ok(session)
    }
}
