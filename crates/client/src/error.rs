//! Unified error handling with Sentry integration.
//!
//! Every fallible client operation returns [`ClientError`]. Front ends show
//! [`ClientError::user_message`] to the user and call [`ClientError::report`]
//! once at the boundary so unexpected failures reach Sentry.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::validation::FieldErrors;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally or by the API, keyed by field.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Authentication is required and could not be restored by a refresh.
    ///
    /// The session has already been cleared when this is returned.
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials were rejected by a token or registration endpoint.
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// The signed-in user may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<FieldErrors> for ClientError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ClientError {
    /// A short message that is safe to show an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::AuthRejected(message) | Self::Forbidden(message) | Self::NotFound(message) => {
                message.clone()
            }
            Self::Api { status, message } if *status < 500 => message.clone(),
            Self::Api { .. } => "The server could not complete the request. Please try again.".to_string(),
            Self::Http(_) => "Could not reach the server. Check your connection and try again.".to_string(),
            Self::Parse(_) => "The server sent an unexpected response.".to_string(),
            Self::Storage(_) => "Could not save local state.".to_string(),
            Self::Config(err) => err.to_string(),
        }
    }

    /// Whether this error indicates a client bug or server fault worth reporting.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Http(_) | Self::Parse(_) | Self::Storage(_) => true,
            _ => false,
        }
    }

    /// Log the error and, when unexpected, capture it to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Client error"
            );
        } else {
            tracing::debug!(error = %self, "Client error");
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after login or a successful session restore.
pub fn set_sentry_user(user_id: &impl ToString, username: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            email: email.filter(|e| !e.is_empty()).map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("menu_item", "7")]));
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
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::NotFound("Restaurant not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Restaurant not found.");

        let err = ClientError::Api {
            status: 409,
            message: "Conflict".to_string(),
        };
        assert_eq!(err.to_string(), "API error (409): Conflict");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = ClientError::Parse(serde_json::from_str::<u32>("nope").unwrap_err());
        assert_eq!(err.user_message(), "The server sent an unexpected response.");
        assert!(err.is_unexpected());

        let err = ClientError::Api {
            status: 500,
            message: "Traceback (most recent call last)".to_string(),
        };
        assert!(!err.user_message().contains("Traceback"));
        assert!(err.is_unexpected());
    }

    #[test]
    fn test_user_message_passes_server_detail() {
        let err = ClientError::Forbidden("You do not have permission to perform this action.".to_string());
        assert_eq!(
            err.user_message(),
            "You do not have permission to perform this action."
        );
        assert!(!err.is_unexpected());

        let err = ClientError::Api {
            status: 400,
            message: "Cannot cancel this order".to_string(),
        };
        assert_eq!(err.user_message(), "Cannot cancel this order");
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let mut errors = FieldErrors::new();
        errors.add("delivery_address", "Delivery address is required");
        let err = ClientError::from(errors);
        assert_eq!(
            err.user_message(),
            "delivery_address: Delivery address is required"
        );
    }
}
