use std::sync::atomic::{AtomicU64, Ordering};

use crate::driver::{TagHandle, TagId, TagTechnology};

/// Prefix of every simulated identifier, so it can never pass for a real UID.
pub const SIMULATED_PREFIX: &str = "SIM-";

/// Length in bytes of a simulated UID (matches a 7-byte NFC UID).
const SIMULATED_UID_LEN: usize = 7;

/// Deterministic stand-in tags for platforms without tag capability.
///
/// The n-th identifier depends only on the seed and n, so two simulators
/// built from the same seed produce the same sequence.
pub struct Simulator {
    seed: String,
    counter: AtomicU64,
}

impl Simulator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Produce the next simulated tag handle.
    pub fn next_handle(&self) -> TagHandle {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        TagHandle::new(self.uid(sequence), TagTechnology::Simulated)
    }

    /// Render a simulated handle as an identifier string.
    pub fn identifier(handle: &TagHandle) -> String {
        format!("{SIMULATED_PREFIX}{}", handle.id.to_hex())
    }

    /// Number of simulated tags handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    fn uid(&self, sequence: u64) -> TagId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"prov-sim-tag-v1:");
        hasher.update(self.seed.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        let digest = hasher.finalize();
        TagId::from(&digest.as_bytes()[..SIMULATED_UID_LEN])
    }
}
