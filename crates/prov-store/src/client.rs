use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use prov_types::{NewProductDescriptor, NewTransfer, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ProductStore;

/// Configuration for [`ProvenanceClient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Upper bound on each store call.
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Create, look up and extend product records.
///
/// Inputs are validated before any store I/O. Reads are safe to retry;
/// creates and appends are not idempotent and must not be blindly retried.
#[derive(Clone)]
pub struct ProvenanceClient {
    store: Arc<dyn ProductStore>,
    config: ClientConfig,
}

impl ProvenanceClient {
    pub fn new(store: Arc<dyn ProductStore>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a product under a freshly generated id, seeded at its origin.
    pub async fn create_product(&self, descriptor: NewProductDescriptor) -> StoreResult<Product> {
        self.create_product_with_id(ProductId::generate(), descriptor)
            .await
    }

    /// Create a product under a caller-chosen id.
    ///
    /// Used when the id was written to a tag before the record existed.
    pub async fn create_product_with_id(
        &self,
        id: ProductId,
        descriptor: NewProductDescriptor,
    ) -> StoreResult<Product> {
        let product = Product::seed(id, descriptor, Utc::now())?;
        debug!(product_id = %product.product_id, "creating product");
        self.bounded(self.store.insert(product)).await
    }

    pub async fn get_product_by_id(&self, id: &ProductId) -> StoreResult<Product> {
        self.bounded(self.store.find(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Append a transfer and return the updated product.
    pub async fn append_transfer(
        &self,
        id: &ProductId,
        transfer: NewTransfer,
    ) -> StoreResult<Product> {
        transfer.validate()?;
        self.bounded(self.store.push_transfer(id, transfer))
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Every product, oldest first.
    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.bounded(self.store.list()).await
    }

    async fn bounded<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        let limit = self.config.call_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?limit, "store call timed out");
                Err(StoreError::Timeout(limit))
            }
        }
    }
}
