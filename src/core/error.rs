use super::types::ContactId;
use thiserror::Error;

/// Failures raised by a `ContactStore` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record {0} not found")]
    NotFound(ContactId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Contact id space exhausted")]
    IdsExhausted,
}

impl StoreError {
    /// Only `Unavailable` is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors surfaced by the contact service and bulk coordinator.
#[derive(Error, Debug)]
pub enum ContactError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Batch item {index} failed: {source}")]
    BatchItemFailed {
        index: usize,
        #[source]
        source: Box<ContactError>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ContactError {
    pub fn contact_not_found() -> Self {
        ContactError::NotFound("Contact not found.".to_string())
    }

    /// Stable machine-readable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            ContactError::Validation(_) => "invalid_argument",
            ContactError::NotFound(_) => "not_found",
            ContactError::BatchItemFailed { source, .. } => source.code(),
            ContactError::Store(StoreError::Unavailable(_)) => "unavailable",
            ContactError::Store(StoreError::NotFound(_)) => "not_found",
            ContactError::Store(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_failure_reports_index_and_inner_code() {
        let err = ContactError::BatchItemFailed {
            index: 3,
            source: Box::new(ContactError::Validation("name is required".to_string())),
        };
        assert_eq!(err.code(), "invalid_argument");
        assert_eq!(
            err.to_string(),
            "Batch item 3 failed: Validation error: name is required"
        );
    }

    #[test]
    fn only_unavailable_is_transient() {
        assert!(StoreError::Unavailable("timeout".into()).is_transient());
        assert!(!StoreError::Io("disk".into()).is_transient());
        assert!(!StoreError::NotFound(ContactId::new(1).unwrap()).is_transient());
    }
}
