use std::fmt;

/// Why an operation ended in [`TagState::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    TagTimeout,
    DriverError,
}

/// Observable state of the tag orchestrator.
///
/// One operation walks `Idle -> AwaitingCapabilityCheck -> AwaitingTag ->
/// Transacting -> Cleanup` and ends in `Completed`, `Failed` or
/// `Cancelled`. Simulation mode skips straight from the capability check to
/// `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagState {
    Idle,
    AwaitingCapabilityCheck,
    AwaitingTag,
    Transacting,
    Cleanup,
    Completed,
    Failed(FailureKind),
    Cancelled,
}

impl TagState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }

    /// Cancellation is honoured only while a tag is awaited or in use.
    pub fn accepts_cancel(&self) -> bool {
        matches!(self, Self::AwaitingTag | Self::Transacting)
    }
}

impl fmt::Display for TagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingCapabilityCheck => write!(f, "awaiting-capability-check"),
            Self::AwaitingTag => write!(f, "awaiting-tag"),
            Self::Transacting => write!(f, "transacting"),
            Self::Cleanup => write!(f, "cleanup"),
            Self::Completed => write!(f, "completed"),
            Self::Failed(FailureKind::TagTimeout) => write!(f, "failed(tag-timeout)"),
            Self::Failed(FailureKind::DriverError) => write!(f, "failed(driver-error)"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
