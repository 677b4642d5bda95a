//! Provenance store for tag-bound products.
//!
//! [`ProductStore`] is the persistence boundary: insert with uniqueness,
//! point lookup, an atomic "move and record" append, and listing.
//! [`ProvenanceClient`] sits in front of any store and adds validation
//! before I/O, id assignment, and a time bound on every call.
//!
//! [`InMemoryProductStore`] is the reference engine used by tests, the
//! bundled server, and local demos.

pub mod client;
pub mod error;
pub mod memory;
pub mod traits;

pub use client::{ClientConfig, ProvenanceClient};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryProductStore;
pub use traits::ProductStore;
