use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::driver::{Discovery, Payload, TagDriver, TagHandle, TagId, TagTechnology};
use crate::error::DriverError;

/// What happens during the next discovery window.
#[derive(Debug)]
pub enum Presentation {
    /// A registered tag enters the field.
    Tag(TagId),
    /// Discovery fails with a driver error.
    Fail(DriverError),
    /// Nothing arrives; the driver reports its own timeout.
    Nothing,
    /// The driver never answers, not even at the timeout.
    Hang,
}

/// A fault injected into the next read or write.
#[derive(Debug)]
pub enum Fault {
    Fail(DriverError),
    Hang,
}

#[derive(Default)]
struct Script {
    tags: HashMap<TagId, Payload>,
    presentations: VecDeque<Presentation>,
    read_faults: VecDeque<Fault>,
    write_faults: VecDeque<Fault>,
    written: Vec<(TagId, Bytes)>,
}

/// Programmable in-memory NFC driver.
///
/// Tags are registered with their stored payload and presented one
/// discovery window at a time. Writes update the stored payload, so a tag
/// written in one operation reads back in the next. Every `cancel` call is
/// counted as one channel release.
pub struct ScriptedDriver {
    available: bool,
    script: Mutex<Script>,
    releases: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            available: true,
            script: Mutex::new(Script::default()),
            releases: AtomicUsize::new(0),
        }
    }

    /// A driver whose platform reports no tag capability.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Register a tag and its stored payload.
    pub fn with_tag(self, id: impl Into<TagId>, payload: Payload) -> Self {
        self.script().tags.insert(id.into(), payload);
        self
    }

    /// Queue what the next discovery window sees.
    pub fn present(&self, presentation: Presentation) {
        self.script().presentations.push_back(presentation);
    }

    /// Queue a registered tag for the next discovery window.
    pub fn present_tag(&self, id: impl Into<TagId>) {
        self.present(Presentation::Tag(id.into()));
    }

    pub fn fail_next_read(&self, fault: Fault) {
        self.script().read_faults.push_back(fault);
    }

    pub fn fail_next_write(&self, fault: Fault) {
        self.script().write_faults.push_back(fault);
    }

    /// Number of times the channel has been released.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Every successful write, in order.
    pub fn written(&self) -> Vec<(TagId, Bytes)> {
        self.script().written.clone()
    }

    /// Current stored payload of a registered tag.
    pub fn payload_of(&self, id: &TagId) -> Option<Payload> {
        self.script().tags.get(id).cloned()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagDriver for ScriptedDriver {
    fn is_capability_available(&self) -> bool {
        self.available
    }

    async fn discover(&self, timeout: Duration) -> Result<Discovery, DriverError> {
        let next = self.script().presentations.pop_front();
        match next.unwrap_or(Presentation::Nothing) {
            Presentation::Tag(id) => Ok(Discovery::Tag(TagHandle::new(id, TagTechnology::Nfc))),
            Presentation::Fail(err) => Err(err),
            Presentation::Nothing => {
                tokio::time::sleep(timeout).await;
                Ok(Discovery::TimedOut)
            }
            Presentation::Hang => std::future::pending().await,
        }
    }

    async fn read_payload(&self, handle: &TagHandle) -> Result<Payload, DriverError> {
        let fault = self.script().read_faults.pop_front();
        match fault {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Hang) => std::future::pending().await,
            None => Ok(self
                .script()
                .tags
                .get(&handle.id)
                .cloned()
                .unwrap_or(Payload::NotEncoded)),
        }
    }

    async fn write_payload(&self, handle: &TagHandle, bytes: &[u8]) -> Result<(), DriverError> {
        let fault = self.script().write_faults.pop_front();
        match fault {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Hang) => std::future::pending().await,
            None => {
                let bytes = Bytes::copy_from_slice(bytes);
                let mut script = self.script();
                script
                    .tags
                    .insert(handle.id.clone(), Payload::Ndef(bytes.clone()));
                script.written.push((handle.id.clone(), bytes));
                Ok(())
            }
        }
    }

    async fn cancel(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
