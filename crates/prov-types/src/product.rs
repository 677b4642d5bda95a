use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require, ValidationError, ValidationResult};
use crate::id::ProductId;
use crate::location::GpsCoordinates;
use crate::transfer::{check_monotonic, NewTransfer, Transfer};

/// Party recorded on the seed transfer when the descriptor names no creator.
pub const UNATTRIBUTED: &str = "unattributed";

/// Descriptive fields supplied when a product is created.
///
/// The identifier and transfer history are assigned by the store client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductDescriptor {
    pub product_name: String,
    pub origin: String,
    pub batch_number: String,
    pub date_produced: NaiveDate,
    /// Must equal `origin` when present: a new product sits at its origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_gps_coordinates: Option<GpsCoordinates>,
}

impl NewProductDescriptor {
    pub fn new(
        product_name: impl Into<String>,
        origin: impl Into<String>,
        batch_number: impl Into<String>,
        date_produced: NaiveDate,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            origin: origin.into(),
            batch_number: batch_number.into(),
            date_produced,
            current_location: None,
            created_by: None,
            initial_gps_coordinates: None,
        }
    }

    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_gps(mut self, coordinates: GpsCoordinates) -> Self {
        self.initial_gps_coordinates = Some(coordinates);
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require("productName", &self.product_name)?;
        require("origin", &self.origin)?;
        require("batchNumber", &self.batch_number)?;
        if let Some(created_by) = &self.created_by {
            require("createdBy", created_by)?;
        }
        if let Some(current) = &self.current_location {
            if current.trim() != self.origin.trim() {
                return Err(ValidationError::LocationMismatch {
                    current: current.clone(),
                    expected: self.origin.clone(),
                });
            }
        }
        if let Some(coords) = &self.initial_gps_coordinates {
            coords.validate()?;
        }
        Ok(())
    }

    /// The party credited with the seed transfer.
    pub fn creator(&self) -> &str {
        self.created_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNATTRIBUTED)
    }
}

/// Creation request as carried over HTTP: a descriptor plus an optional
/// caller-chosen id. Without an id the receiving side generates one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(flatten)]
    pub descriptor: NewProductDescriptor,
}

impl CreateProductRequest {
    /// Rebuild the request that would recreate `product` under its own id.
    pub fn from_product(product: &Product) -> Self {
        let seed = product.transfer_history.first();
        Self {
            product_id: Some(product.product_id.clone()),
            descriptor: NewProductDescriptor {
                product_name: product.product_name.clone(),
                origin: product.origin.clone(),
                batch_number: product.batch_number.clone(),
                date_produced: product.date_produced,
                current_location: None,
                created_by: Some(product.created_by.clone()),
                initial_gps_coordinates: seed.and_then(|t| t.gps_coordinates),
            },
        }
    }
}

/// A product record and the custody chain it exclusively owns.
///
/// The chain can only grow through [`Product::apply_transfer`], which keeps
/// `current_location` pinned to the last entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub origin: String,
    pub batch_number: String,
    pub date_produced: NaiveDate,
    pub created_by: String,
    current_location: String,
    transfer_history: Vec<Transfer>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new product whose history holds one transfer at its origin.
    pub fn seed(
        product_id: ProductId,
        descriptor: NewProductDescriptor,
        now: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        descriptor.validate()?;

        let origin = descriptor.origin.trim().to_string();
        let created_by = descriptor.creator().to_string();
        let seed = Transfer {
            location: origin.clone(),
            transferred_by: created_by.clone(),
            timestamp: now,
            gps_coordinates: descriptor.initial_gps_coordinates,
        };

        Ok(Self {
            product_id,
            product_name: descriptor.product_name.trim().to_string(),
            current_location: origin.clone(),
            origin,
            batch_number: descriptor.batch_number.trim().to_string(),
            date_produced: descriptor.date_produced,
            created_by,
            transfer_history: vec![seed],
            created_at: now,
            updated_at: now,
        })
    }

    /// Append a custody transfer and move `current_location` with it.
    ///
    /// A missing timestamp becomes `max(now, last.timestamp)`. A supplied
    /// timestamp older than the last entry is rejected and nothing changes.
    pub fn apply_transfer(
        &mut self,
        transfer: NewTransfer,
        now: DateTime<Utc>,
    ) -> ValidationResult<&Transfer> {
        transfer.validate()?;

        let previous = self.transfer_history.last().map(|t| t.timestamp);
        let timestamp = match (transfer.timestamp, previous) {
            (Some(ts), Some(prev)) if ts < prev => {
                return Err(ValidationError::NonMonotonicTimestamp {
                    index: self.transfer_history.len(),
                    previous: prev,
                    timestamp: ts,
                });
            }
            (Some(ts), _) => ts,
            (None, Some(prev)) => now.max(prev),
            (None, None) => now,
        };

        let entry = Transfer {
            location: transfer.location.trim().to_string(),
            transferred_by: transfer.transferred_by.trim().to_string(),
            timestamp,
            gps_coordinates: transfer.gps_coordinates,
        };

        self.current_location = entry.location.clone();
        self.updated_at = timestamp;
        self.transfer_history.push(entry);

        let last = self.transfer_history.len() - 1;
        Ok(&self.transfer_history[last])
    }

    pub fn current_location(&self) -> &str {
        &self.current_location
    }

    pub fn transfer_history(&self) -> &[Transfer] {
        &self.transfer_history
    }

    pub fn latest_transfer(&self) -> Option<&Transfer> {
        self.transfer_history.last()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Check every data-model invariant on this record.
    ///
    /// Useful on records that arrive over the wire, where the append path
    /// was not under local control.
    pub fn verify(&self) -> ValidationResult<()> {
        let last = self
            .transfer_history
            .last()
            .ok_or(ValidationError::EmptyHistory)?;
        if self.current_location != last.location {
            return Err(ValidationError::LocationMismatch {
                current: self.current_location.clone(),
                expected: last.location.clone(),
            });
        }
        check_monotonic(&self.transfer_history)
    }
}
