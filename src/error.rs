//! Validation errors raised before a transaction is scored

use thiserror::Error;

/// The single error kind of the scoring path.
///
/// Every variant is produced while turning a [`TransactionInput`] into a
/// [`TransactionRecord`]; once a record exists, scoring cannot fail.
///
/// [`TransactionInput`]: crate::types::transaction::TransactionInput
/// [`TransactionRecord`]: crate::types::transaction::TransactionRecord
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required field absent (or blank, for identifiers)
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but outside its declared domain
    #[error("field {field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Timestamp that matches none of the accepted formats
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Payload that could not be decoded at all
    #[error("malformed transaction: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }

    /// Name of the offending field, when the error concerns a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) | Self::OutOfRange { field, .. } => Some(*field),
            Self::InvalidTimestamp(_) => Some("timestamp"),
            Self::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
