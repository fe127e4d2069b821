//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::invoice::InvoiceError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout session could not be built.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Invoice generation failed.
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure is server-side and worth a Sentry event.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash
            ),
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::Repository(_) | CheckoutError::Provider(_)
            ),
            Self::Order(err) => matches!(err, OrderError::Repository(_)),
            Self::Invoice(err) => matches!(
                err,
                InvoiceError::Repository(_) | InvoiceError::Render(_)
            ),
            Self::NotFound(_) | Self::Validation(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::AmountOverflow(_) => {
                    StatusCode::BAD_REQUEST
                }
                // Retryable: the provider failed, nothing was persisted
                CheckoutError::Provider(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart => StatusCode::BAD_REQUEST,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Invoice(err) => match err {
                InvoiceError::NotFound => StatusCode::NOT_FOUND,
                InvoiceError::NotPurchaser => StatusCode::FORBIDDEN,
                InvoiceError::Repository(_) | InvoiceError::Render(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::AmountOverflow(_) => "Cart total is out of range".to_string(),
                CheckoutError::Provider(_) => {
                    "Payment service is unavailable, please try again".to_string()
                }
                CheckoutError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart => "Your cart is empty".to_string(),
                OrderError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Invoice(err) => match err {
                InvoiceError::NotFound => "Order not found".to_string(),
                InvoiceError::NotPurchaser => "You do not have access to this order".to_string(),
                InvoiceError::Repository(_) | InvoiceError::Render(_) => {
                    "Internal server error".to_string()
                }
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::Validation("quantity must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: quantity must be at least 1"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_cart_is_a_client_error() {
        use crate::services::checkout::CheckoutError;
        use crate::services::orders::OrderError;

        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_provider_failure_maps_to_bad_gateway() {
        use crate::payments::PaymentsError;
        use crate::services::checkout::CheckoutError;

        let err = AppError::Checkout(CheckoutError::Provider(PaymentsError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invoice_authorization_maps_to_forbidden() {
        use crate::services::invoice::InvoiceError;

        assert_eq!(
            get_status(AppError::Invoice(InvoiceError::NotPurchaser)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Invoice(InvoiceError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
