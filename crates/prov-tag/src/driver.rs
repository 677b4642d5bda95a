use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::DriverError;

/// Raw hardware identifier of a tag (NFC UID or scanned code bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TagId(Bytes);

impl TagId {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uppercase hex, the conventional rendering of an NFC UID.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl From<&[u8]> for TagId {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for TagId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({})", self.to_hex())
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hardware family that produced a tag handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTechnology {
    Nfc,
    Optical,
    Simulated,
}

/// A tag currently presented to the reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagHandle {
    pub id: TagId,
    pub technology: TagTechnology,
}

impl TagHandle {
    pub fn new(id: impl Into<TagId>, technology: TagTechnology) -> Self {
        Self {
            id: id.into(),
            technology,
        }
    }
}

/// Result of one discovery window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Discovery {
    Tag(TagHandle),
    TimedOut,
}

/// Content read from a tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// An NDEF message as stored on an NFC tag.
    Ndef(Bytes),
    /// Plain text, as delivered by optical scanners.
    Text(String),
    /// The tag carries no structured record; use its raw identifier.
    NotEncoded,
}

/// Hardware boundary for tag I/O.
///
/// Implementations must satisfy these rules:
/// - `is_capability_available` never blocks and never fails.
/// - `discover` resolves to exactly one of a tag, a timeout, or an error.
/// - Every suspending call may be dropped mid-flight; dropping it must not
///   leave the driver unusable.
/// - `cancel` is idempotent and releases any hardware registration held for
///   the current operation.
#[async_trait]
pub trait TagDriver: Send + Sync {
    /// Probe whether the platform offers this tag capability at all.
    fn is_capability_available(&self) -> bool;

    /// Wait for a tag to be presented, for at most `timeout`.
    async fn discover(&self, timeout: Duration) -> Result<Discovery, DriverError>;

    /// Read the structured payload of a discovered tag.
    async fn read_payload(&self, handle: &TagHandle) -> Result<Payload, DriverError>;

    /// Write raw payload bytes to a discovered tag.
    async fn write_payload(&self, handle: &TagHandle, bytes: &[u8]) -> Result<(), DriverError>;

    /// Abort in-flight work and release the hardware channel.
    async fn cancel(&self);
}
