//! Error types for the submission pipeline.

use crate::model::FieldId;
use thiserror::Error;

/// Shown when a failure carries no message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Raised locally, before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<FieldId>),

    #[error("Invalid email format")]
    InvalidEmail,
}

fn join_fields(fields: &[FieldId]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raised by a document store write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store answered and refused the write.
    #[error("{message}")]
    Rejected {
        status: Option<String>,
        message: String,
    },

    /// The request never produced a usable answer.
    #[error("{0}")]
    Transport(String),

    /// The store answered with a body that could not be understood.
    #[error("{0}")]
    Decode(String),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            status: None,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A previous submission has not finished yet.
    #[error("A submission is already in progress")]
    InProgress,
}

impl SubmitError {
    /// Message shown in the error banner.
    pub fn display_message(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_keys_in_order() {
        let e = ValidationError::MissingFields(vec![FieldId::Name2, FieldId::Phone1]);
        assert_eq!(e.to_string(), "Missing required fields: name2, phone1");
    }

    #[test]
    fn store_rejection_displays_server_message_verbatim() {
        let e = SubmitError::from(StoreError::rejected("quota exceeded"));
        assert_eq!(e.display_message(), "quota exceeded");
    }

    #[test]
    fn empty_store_message_falls_back_to_generic() {
        let e = SubmitError::from(StoreError::rejected("  "));
        assert_eq!(e.display_message(), GENERIC_ERROR_MESSAGE);
        let e = SubmitError::from(StoreError::Transport(String::new()));
        assert_eq!(e.display_message(), GENERIC_ERROR_MESSAGE);
    }
}
