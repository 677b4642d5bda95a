use std::time::Duration;

use crate::driver::TagId;
use crate::ndef::NdefError;
use crate::state::FailureKind;

/// Failures raised by a tag transport driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The tag left the field before the transaction finished.
    #[error("tag was lost during the transaction")]
    TagLost,

    /// The tag or code cannot be written.
    #[error("tag is not writable: {0}")]
    NotWritable(String),

    /// A read or write did not finish within the transaction bound.
    #[error("tag transaction exceeded {0:?}")]
    TransactionTimeout(Duration),

    /// The payload could not be encoded for the tag.
    #[error("payload encoding failed: {0}")]
    Encoding(#[from] NdefError),

    /// A different tag was presented than the one the operation started with.
    #[error("expected tag {expected}, but tag {presented} was presented")]
    TagSwapped { expected: TagId, presented: TagId },

    /// The scanner input stream ended.
    #[error("scanner input closed")]
    InputClosed,

    /// I/O error from the underlying device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other controller-reported failure.
    #[error("hardware error: {0}")]
    Hardware(String),
}

/// Terminal failures of a tag operation.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The platform lacks the tag capability and simulation was not allowed.
    #[error("tag capability is unavailable on this platform")]
    CapabilityUnavailable,

    /// No tag was presented within the discovery window.
    #[error("no tag presented within {0:?}")]
    TagTimeout(Duration),

    /// The driver failed; the underlying cause is preserved.
    #[error("tag driver error: {0}")]
    Driver(#[from] DriverError),

    /// The caller aborted the operation.
    #[error("tag operation cancelled")]
    Cancelled,

    /// Another operation currently holds the tag channel.
    #[error("tag channel is busy with another operation")]
    Busy,
}

impl TagError {
    /// Whether presenting the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TagTimeout(_) | Self::Driver(_) | Self::Busy)
    }

    /// The failed-state classification, for errors that end in `Failed`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::TagTimeout(_) => Some(FailureKind::TagTimeout),
            Self::Driver(_) => Some(FailureKind::DriverError),
            _ => None,
        }
    }
}

/// Result alias for tag operations.
pub type TagResult<T> = Result<T, TagError>;
