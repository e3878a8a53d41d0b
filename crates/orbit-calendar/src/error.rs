//! Calendar-specific error types.

use orbit_core::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid event: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Failed to load {entity}: {message}")]
    DataAccess {
        entity: &'static str,
        message: String,
    },
}

impl CalendarError {
    pub fn data_access(entity: &'static str, message: impl Into<String>) -> Self {
        Self::DataAccess {
            entity,
            message: message.into(),
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => format!("Please fix the highlighted fields: {}", errors),
            Self::DataAccess { .. } => "Could not load your calendar. Please try again.".to_string(),
        }
    }

    /// Whether the caller sent bad input, as opposed to a storage failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
