use std::time::Duration;

use prov_types::{ProductId, ValidationError};

/// Errors produced by product store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("product not found: {0}")]
    NotFound(ProductId),

    #[error("product already exists: {0}")]
    Conflict(ProductId),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A remote engine refused the request as invalid.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether the same call may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Timeout(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(StoreError::Backend("connection reset".into()).is_retryable());
        assert!(StoreError::Timeout(Duration::from_secs(10)).is_retryable());

        let id = ProductId::parse("PRD-1").unwrap();
        assert!(!StoreError::NotFound(id.clone()).is_retryable());
        assert!(!StoreError::Conflict(id).is_retryable());
        assert!(!StoreError::Rejected("bad date".into()).is_retryable());
        assert!(!StoreError::from(ValidationError::EmptyHistory).is_retryable());
    }
}
