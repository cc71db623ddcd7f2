//! Error types for Dining Gateway services

use thiserror::Error;

/// Unified error type for Dining Gateway operations
#[derive(Debug, Error)]
pub enum DiningGatewayError {
    /// Configuration loading or validation failed
    #[error("configuration error: {message}")]
    ConfigurationError {
        message: String,
        key: Option<String>,
    },

    /// Input rejected at a write boundary
    #[error("validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    /// Database query or connection failure
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// The latent-factor model backend could not be reached or loaded
    #[error("model unavailable: {message}")]
    ModelUnavailable { message: String },

    /// A referenced entity does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The evaluation window contains no rated interactions
    #[error("no rated test interactions found in the last {test_period_days} day(s)")]
    InsufficientTestData {
        test_period_days: i64,
        training_interactions: u64,
    },

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl DiningGatewayError {
    /// Validation error without a field reference
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Validation error attached to a specific field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Model-unavailable error with a message
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }

    /// Not-found error for a named resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_field_carries_field_name() {
        let err = DiningGatewayError::validation_field("rating out of range", "rating");
        match err {
            DiningGatewayError::ValidationError { message, field } => {
                assert_eq!(message, "rating out of range");
                assert_eq!(field.as_deref(), Some("rating"));
            }
            _ => panic!("expected ValidationError"),
        }
    }

    #[test]
    fn test_insufficient_test_data_display() {
        let err = DiningGatewayError::InsufficientTestData {
            test_period_days: 7,
            training_interactions: 120,
        };
        assert!(err.to_string().contains("7 day"));
    }

    #[test]
    fn test_not_found_display() {
        let err = DiningGatewayError::not_found("menu item");
        assert_eq!(err.to_string(), "menu item not found");
    }
}
