//! Physical tag I/O for tag-bound provenance.
//!
//! A tag is a transient resource: it appears in the reader's field, is read
//! or written once, and disappears. This crate sequences that interaction
//! under timeout and cancellation, and degrades to a deterministic simulated
//! result when the platform has no tag capability at all.
//!
//! # Layers
//!
//! - [`TagDriver`] -- hardware boundary: capability probe plus
//!   discover/read/write/cancel
//! - [`TagOrchestrator`] -- the state machine running one logical read or
//!   write against a driver
//! - [`ndef`] -- NDEF Text record codec for payloads written to NFC tags
//!
//! # Drivers
//!
//! - [`UnavailableDriver`] -- no capability; forces simulation mode
//! - [`LineScannerDriver`] -- keyboard-wedge optical scanner reading lines
//! - [`ScriptedDriver`] -- programmable in-memory driver for tests and demos
//!
//! # Guarantees
//!
//! 1. At most one operation holds the tag channel; a second is rejected.
//! 2. The channel is released exactly once per hardware operation, before
//!    the terminal state becomes observable.
//! 3. A real hardware failure is never replaced by a simulated result.

pub mod config;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod ndef;
pub mod orchestrator;
pub mod sim;
pub mod state;

pub use config::TagConfig;
pub use driver::{Discovery, Payload, TagDriver, TagHandle, TagId, TagTechnology};
pub use drivers::line_scanner::LineScannerDriver;
pub use drivers::scripted::{Fault, Presentation, ScriptedDriver};
pub use drivers::unavailable::UnavailableDriver;
pub use error::{DriverError, TagError, TagResult};
pub use ndef::{NdefError, NdefRecord};
pub use orchestrator::{CapabilityMode, ReadOutcome, ReadSource, TagOrchestrator, WriteOutcome};
pub use sim::Simulator;
pub use state::{FailureKind, TagState};
