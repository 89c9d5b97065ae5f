//! Unified application error types for Meshboard.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource (module, action, setting) was not found.
    NotFound,
    /// Inbound request authentication failed (bad or missing signature).
    Authentication,
    /// Input validation failed.
    Validation,
    /// The settings store was accessed before initialization.
    NotInitialized,
    /// A configuration error occurred (unreadable storage, bad config file).
    Configuration,
    /// A module failed to load, initialize, or execute.
    Module,
    /// An outbound delivery (notification, webhook POST) failed.
    Delivery,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotInitialized => write!(f, "NOT_INITIALIZED"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Module => write!(f, "MODULE"),
            Self::Delivery => write!(f, "DELIVERY"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// The schema key of the offending field.
    pub field: String,
    /// Human-readable message referencing the field label.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The unified application error used throughout Meshboard.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. Validation failures additionally carry
/// the structured field list in `details` so API callers receive
/// `[{field, message}]` rather than a flattened string.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional structured details (e.g. validation error list).
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error from a plain message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a validation error carrying the structured field list.
    ///
    /// The whole save is rejected; no partial settings are applied.
    pub fn validation_fields(errors: Vec<FieldError>) -> Self {
        let message = match errors.len() {
            1 => format!("Validation failed: {}", errors[0].message),
            n => format!("Validation failed with {n} errors"),
        };
        Self {
            kind: ErrorKind::Validation,
            message,
            details: serde_json::to_value(&errors).ok(),
            source: None,
        }
    }

    /// Create a not-initialized error.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotInitialized, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a module error.
    pub fn module(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Module, message)
    }

    /// Create a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Delivery, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the structured validation error list, if this is a
    /// field-level validation failure.
    pub fn field_errors(&self) -> Option<Vec<FieldError>> {
        self.details
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, "JSON error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_fields_round_trips_details() {
        let err = AppError::validation_fields(vec![
            FieldError::new("botToken", "Bot Token is required"),
            FieldError::new("maxLogEntries", "Max Log Entries must be at least 1"),
        ]);
        assert_eq!(err.kind, ErrorKind::Validation);
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "botToken");
    }

    #[test]
    fn single_error_message_names_the_field() {
        let err = AppError::validation_fields(vec![FieldError::new("url", "URL is required")]);
        assert!(err.message.contains("URL is required"));
    }
}
