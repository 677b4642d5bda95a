//! State machine for one logical tag read or write.
//!
//! An operation claims the tag channel, checks the platform capability
//! (probed once and cached), waits a single window for a tag, performs one
//! transaction, and releases the channel before its terminal state becomes
//! visible. Cancellation is cooperative: the in-flight driver future is
//! dropped and cleanup runs as usual.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use bytes::Bytes;
use tokio::sync::{watch, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::config::TagConfig;
use crate::driver::{Discovery, Payload, TagDriver, TagHandle};
use crate::error::{DriverError, TagError, TagResult};
use crate::ndef;
use crate::sim::Simulator;
use crate::state::{FailureKind, TagState};

/// How operations are served, decided once by [`TagOrchestrator::initialize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityMode {
    Hardware,
    Simulation,
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Simulation => write!(f, "simulation"),
        }
    }
}

/// Where a read's identifier came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadSource {
    /// Decoded from the tag's stored payload.
    Payload,
    /// The tag's raw hardware identifier.
    HardwareId,
    /// Generated by the simulator.
    Simulated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadOutcome {
    pub identifier: String,
    pub source: ReadSource,
    pub simulated: bool,
    pub tag: TagHandle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    pub tag: TagHandle,
    pub simulated: bool,
    pub bytes_written: usize,
}

enum Transaction {
    Read,
    Write(Bytes),
}

enum Completion {
    Read(Payload),
    Written(usize),
}

/// Runs tag operations against a driver, one at a time.
pub struct TagOrchestrator {
    driver: Arc<dyn TagDriver>,
    config: TagConfig,
    mode: OnceLock<CapabilityMode>,
    channel: Arc<tokio::sync::Mutex<()>>,
    state: watch::Sender<TagState>,
    cancel: Mutex<Option<watch::Sender<bool>>>,
    simulator: Simulator,
}

impl TagOrchestrator {
    pub fn new(driver: Arc<dyn TagDriver>, config: TagConfig) -> Self {
        let simulator = Simulator::new(config.simulation_seed.clone());
        let (state, _) = watch::channel(TagState::Idle);
        Self {
            driver,
            config,
            mode: OnceLock::new(),
            channel: Arc::new(tokio::sync::Mutex::new(())),
            state,
            cancel: Mutex::new(None),
            simulator,
        }
    }

    /// Probe the driver's capability. The first call decides the mode for
    /// the lifetime of the orchestrator; later calls return the cached mode.
    pub fn initialize(&self) -> TagResult<CapabilityMode> {
        let mode = *self.mode.get_or_init(|| {
            let mode = if self.driver.is_capability_available() {
                CapabilityMode::Hardware
            } else {
                CapabilityMode::Simulation
            };
            info!(%mode, "tag capability probed");
            mode
        });

        if mode == CapabilityMode::Simulation && !self.config.allow_simulation {
            return Err(TagError::CapabilityUnavailable);
        }
        Ok(mode)
    }

    pub fn state(&self) -> TagState {
        *self.state.borrow()
    }

    /// Watch state transitions as they happen.
    pub fn subscribe(&self) -> watch::Receiver<TagState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// Request cancellation of the in-flight operation.
    ///
    /// Returns `false` (and does nothing) unless an operation is waiting
    /// for a tag or transacting with one.
    pub fn cancel(&self) -> bool {
        if !self.state().accepts_cancel() {
            return false;
        }
        match self.cancel_slot().as_ref() {
            Some(signal) => {
                signal.send_replace(true);
                info!("tag operation cancel requested");
                true
            }
            None => false,
        }
    }

    /// Read one tag and resolve it to an identifier.
    ///
    /// Resolution prefers a decoded payload, then the raw hardware
    /// identifier, then a simulated identifier.
    pub async fn read(&self) -> TagResult<ReadOutcome> {
        let Some(mut lease) = self.begin()? else {
            let tag = self.simulator.next_handle();
            self.transition(TagState::Completed);
            return Ok(ReadOutcome {
                identifier: Simulator::identifier(&tag),
                source: ReadSource::Simulated,
                simulated: true,
                tag,
            });
        };

        let (tag, completion) = self.execute(&mut lease, Transaction::Read).await?;
        let payload = match completion {
            Completion::Read(payload) => payload,
            Completion::Written(_) => Payload::NotEncoded,
        };
        Ok(self.resolve(tag, payload))
    }

    /// Write `text` to a tag as a single NDEF Text record.
    pub async fn write_text(&self, text: &str) -> TagResult<WriteOutcome> {
        let bytes = ndef::encode_text(&self.config.language, text).map_err(DriverError::from)?;
        self.write_payload(bytes).await
    }

    /// Write raw payload bytes to a tag.
    pub async fn write_payload(&self, bytes: Bytes) -> TagResult<WriteOutcome> {
        let Some(mut lease) = self.begin()? else {
            let tag = self.simulator.next_handle();
            self.transition(TagState::Completed);
            return Ok(WriteOutcome {
                tag,
                simulated: true,
                bytes_written: bytes.len(),
            });
        };

        let (tag, completion) = self.execute(&mut lease, Transaction::Write(bytes)).await?;
        let bytes_written = match completion {
            Completion::Written(n) => n,
            Completion::Read(_) => 0,
        };
        Ok(WriteOutcome {
            tag,
            simulated: false,
            bytes_written,
        })
    }

    /// Claim the channel and check capability. `None` means the operation
    /// is served by the simulator and needs no hardware lease.
    fn begin(&self) -> TagResult<Option<ChannelLease<'_>>> {
        let guard = Arc::clone(&self.channel)
            .try_lock_owned()
            .map_err(|_| TagError::Busy)?;
        let mut lease = ChannelLease {
            owner: self,
            guard: Some(guard),
            released: false,
        };

        self.transition(TagState::AwaitingCapabilityCheck);
        match self.initialize() {
            Ok(CapabilityMode::Hardware) => Ok(Some(lease)),
            Ok(CapabilityMode::Simulation) => {
                lease.released = true;
                Ok(None)
            }
            Err(e) => {
                lease.released = true;
                self.transition(TagState::Idle);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        lease: &mut ChannelLease<'_>,
        transaction: Transaction,
    ) -> TagResult<(TagHandle, Completion)> {
        let (signal, mut cancelled) = watch::channel(false);
        *self.cancel_slot() = Some(signal);
        self.transition(TagState::AwaitingTag);

        let outcome = self.drive(&mut cancelled, transaction).await;

        self.transition(TagState::Cleanup);
        self.cancel_slot().take();
        lease.released = true;
        self.driver.cancel().await;

        let terminal = match &outcome {
            Ok(_) => TagState::Completed,
            Err(TagError::Cancelled) => TagState::Cancelled,
            Err(e) => TagState::Failed(e.failure_kind().unwrap_or(FailureKind::DriverError)),
        };
        if let Err(e) = &outcome {
            warn!(error = %e, "tag operation did not complete");
        }
        self.transition(terminal);
        outcome
    }

    async fn drive(
        &self,
        cancelled: &mut watch::Receiver<bool>,
        transaction: Transaction,
    ) -> TagResult<(TagHandle, Completion)> {
        let window = self.config.discover_timeout;
        let discovery = tokio::select! {
            biased;
            _ = cancel_requested(cancelled) => return Err(TagError::Cancelled),
            res = tokio::time::timeout(window, self.driver.discover(window)) => res,
        };

        let tag = match discovery {
            Err(_) | Ok(Ok(Discovery::TimedOut)) => return Err(TagError::TagTimeout(window)),
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(Discovery::Tag(tag))) => tag,
        };
        debug!(tag = %tag.id, technology = ?tag.technology, "tag discovered");

        self.transition(TagState::Transacting);
        let limit = self.config.transaction_timeout;
        let io = async {
            match &transaction {
                Transaction::Read => self.driver.read_payload(&tag).await.map(Completion::Read),
                Transaction::Write(bytes) => self
                    .driver
                    .write_payload(&tag, bytes)
                    .await
                    .map(|()| Completion::Written(bytes.len())),
            }
        };

        let completion = tokio::select! {
            biased;
            _ = cancel_requested(cancelled) => return Err(TagError::Cancelled),
            res = tokio::time::timeout(limit, io) => {
                res.map_err(|_| DriverError::TransactionTimeout(limit))??
            }
        };
        Ok((tag, completion))
    }

    fn resolve(&self, tag: TagHandle, payload: Payload) -> ReadOutcome {
        let decoded = match payload {
            Payload::Ndef(bytes) => match ndef::decode_text(&bytes) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(tag = %tag.id, error = %e, "tag payload unreadable, using hardware id");
                    None
                }
            },
            Payload::Text(text) => Some(text),
            Payload::NotEncoded => None,
        };

        if let Some(text) = decoded.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return ReadOutcome {
                identifier: text,
                source: ReadSource::Payload,
                simulated: false,
                tag,
            };
        }

        if !tag.id.is_empty() {
            return ReadOutcome {
                identifier: tag.id.to_hex(),
                source: ReadSource::HardwareId,
                simulated: false,
                tag,
            };
        }

        let stand_in = self.simulator.next_handle();
        warn!("tag reported neither payload nor id, using simulated identifier");
        ReadOutcome {
            identifier: Simulator::identifier(&stand_in),
            source: ReadSource::Simulated,
            simulated: true,
            tag,
        }
    }

    fn transition(&self, next: TagState) {
        let previous = self.state.send_replace(next);
        debug!(from = %previous, to = %next, "tag state");
    }

    fn cancel_slot(&self) -> MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves once cancellation is requested; never resolves otherwise.
async fn cancel_requested(signal: &mut watch::Receiver<bool>) {
    let requested = signal.wait_for(|flag| *flag).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

/// Exclusive hold on the tag channel for one operation.
///
/// If the operation's future is dropped before cleanup ran, the driver is
/// released from a spawned task and the state is set to `Cancelled`. That
/// task keeps the channel claimed until `cancel()` has returned.
struct ChannelLease<'a> {
    owner: &'a TagOrchestrator,
    guard: Option<OwnedMutexGuard<()>>,
    released: bool,
}

impl Drop for ChannelLease<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.owner.cancel_slot().take();
        let driver = Arc::clone(&self.owner.driver);
        let guard = self.guard.take();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    driver.cancel().await;
                    drop(guard);
                });
            }
            Err(_) => warn!("no runtime to release tag channel on drop"),
        }
        self.owner.transition(TagState::Cancelled);
    }
}
