//! High-level SDK for tag-bound provenance.
//!
//! [`ProvenanceService`] composes the two flows front ends need:
//!
//! - **bind**: read a tag, write a fresh product id to it, create the
//!   product seeded at its origin
//! - **resolve**: read a tag (or take a typed id), fetch the product, then
//!   record custody transfers against it
//!
//! [`HttpProductStore`] lets the same service run against a remote
//! provenance server instead of an in-process store.

pub mod error;
pub mod remote;
pub mod service;

pub use error::{ErrorKind, SdkError, SdkResult};
pub use remote::{HttpProductStore, HttpStoreConfig};
pub use service::{BoundProduct, ProvenanceService, Resolution};

// Re-export key types
pub use prov_store::{ClientConfig, InMemoryProductStore, ProductStore, ProvenanceClient};
pub use prov_tag::{ReadOutcome, TagConfig, TagDriver, TagOrchestrator};
pub use prov_types::{GpsCoordinates, NewProductDescriptor, NewTransfer, Product, ProductId, Transfer};
