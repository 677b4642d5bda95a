//! Foundation types for tag-bound product provenance.
//!
//! This crate holds the value types shared by the tag orchestrator, the
//! provenance store client, and the HTTP surface. Every other `prov` crate
//! depends on `prov-types`.
//!
//! # Key Types
//!
//! - [`ProductId`] -- Opaque, globally unique product identifier
//! - [`Product`] -- Product record owning its custody chain
//! - [`Transfer`] -- One recorded custody transfer
//! - [`NewTransfer`] -- Caller-supplied transfer awaiting a timestamp
//! - [`NewProductDescriptor`] -- Descriptive fields for product creation
//! - [`CreateProductRequest`] -- Descriptor plus optional id, as sent over HTTP
//! - [`GpsCoordinates`] -- Optional location fix attached to a transfer
//!
//! # Invariants
//!
//! 1. A product's transfer history is append-only and never empty.
//! 2. `current_location` always equals the last transfer's location.
//! 3. Transfer timestamps are non-decreasing along the history.

pub mod error;
pub mod id;
pub mod location;
pub mod product;
pub mod transfer;

pub use error::{ValidationError, ValidationResult};
pub use id::ProductId;
pub use location::GpsCoordinates;
pub use product::{CreateProductRequest, NewProductDescriptor, Product, UNATTRIBUTED};
pub use transfer::{check_monotonic, NewTransfer, Transfer};
