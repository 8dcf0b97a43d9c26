//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use makrama_core::MoneyError;
use thiserror::Error;

use crate::blpaczka::BlPaczkaError;
use crate::planetpay::PlanetPayError;
use crate::woo::WooError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// WooCommerce API operation failed.
    #[error("WooCommerce error: {0}")]
    Woo(#[from] WooError),

    /// Planet Pay API operation failed.
    #[error("Planet Pay error: {0}")]
    PlanetPay(#[from] PlanetPayError),

    /// BLPaczka API operation failed.
    #[error("BLPaczka error: {0}")]
    BlPaczka(#[from] BlPaczkaError),

    /// Session read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Upstream sent an amount we could not convert.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry; upstream 404s are not errors
        let capture = match &self {
            Self::Woo(WooError::NotFound(_)) | Self::PlanetPay(PlanetPayError::NotFound(_)) => {
                false
            }
            Self::Woo(_)
            | Self::PlanetPay(_)
            | Self::BlPaczka(_)
            | Self::Session(_)
            | Self::Money(_)
            | Self::Internal(_) => true,
            _ => false,
        };

        if capture {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Woo(err) => match err {
                WooError::NotFound(_) => StatusCode::NOT_FOUND,
                WooError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::PlanetPay(err) => match err {
                PlanetPayError::NotFound(_) => StatusCode::NOT_FOUND,
                PlanetPayError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::BlPaczka(_) | Self::Money(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Woo(err) => match err {
                WooError::NotFound(_) => "Not found".to_string(),
                WooError::RateLimited(_) => "Shop is busy, please retry shortly".to_string(),
                _ => "External service error".to_string(),
            },
            Self::PlanetPay(err) => match err {
                PlanetPayError::NotFound(_) => "Not found".to_string(),
                PlanetPayError::InvalidSignature(_) => "Invalid signature".to_string(),
                _ => "Payment service error".to_string(),
            },
            Self::BlPaczka(_) => "Shipping service error".to_string(),
            Self::Money(_) => "External service error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Woo(WooError::NotFound("missing".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::PlanetPay(PlanetPayError::InvalidSignature(
                "bad".to_string()
            ))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_upstream_errors_hide_details() {
        let err = AppError::Woo(WooError::Api {
            status: 500,
            message: "secret internal detail".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
