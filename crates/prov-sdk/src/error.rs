use std::fmt;

use prov_store::StoreError;
use prov_tag::TagError;
use prov_types::ValidationError;
use thiserror::Error;

/// Coarse classification used by front ends to pick a recovery path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    CapabilityUnavailable,
    TagTimeout,
    DriverError,
    Cancelled,
    Busy,
    NotFound,
    Conflict,
    ValidationError,
    Backend,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CapabilityUnavailable => "capability-unavailable",
            Self::TagTimeout => "tag-timeout",
            Self::DriverError => "driver-error",
            Self::Cancelled => "cancelled",
            Self::Busy => "busy",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::ValidationError => "validation-error",
            Self::Backend => "backend",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Tag(TagError::CapabilityUnavailable) => ErrorKind::CapabilityUnavailable,
            Self::Tag(TagError::TagTimeout(_)) => ErrorKind::TagTimeout,
            Self::Tag(TagError::Driver(_)) => ErrorKind::DriverError,
            Self::Tag(TagError::Cancelled) => ErrorKind::Cancelled,
            Self::Tag(TagError::Busy) => ErrorKind::Busy,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            Self::Store(StoreError::Validation(_) | StoreError::Rejected(_)) | Self::Validation(_) => {
                ErrorKind::ValidationError
            }
            Self::Store(StoreError::Backend(_) | StoreError::Timeout(_)) => ErrorKind::Backend,
        }
    }

    /// Whether presenting the tag again or repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TagTimeout | ErrorKind::DriverError | ErrorKind::Busy | ErrorKind::Backend
        )
    }

    /// Whether the user should be offered to type the product id by hand.
    pub fn offers_manual_entry(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
