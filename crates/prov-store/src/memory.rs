use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use prov_types::{NewTransfer, Product, ProductId};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::ProductStore;

/// In-memory product store for tests, local demos, and the bundled server.
///
/// The write lock is held across every read-modify-write, which is what
/// makes appends atomic per product.
pub struct InMemoryProductStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    /// Number of stored products.
    pub fn len(&self) -> StoreResult<usize> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("product store read lock poisoned".into()))?;
        Ok(state.products.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("product store write lock poisoned".into()))?;

        if state.products.contains_key(&product.product_id) {
            return Err(StoreError::Conflict(product.product_id));
        }

        info!(product_id = %product.product_id, origin = %product.origin, "product created");
        state
            .products
            .insert(product.product_id.clone(), product.clone());
        Ok(product)
    }

    async fn find(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("product store read lock poisoned".into()))?;
        Ok(state.products.get(id).cloned())
    }

    async fn push_transfer(
        &self,
        id: &ProductId,
        transfer: NewTransfer,
    ) -> StoreResult<Option<Product>> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("product store write lock poisoned".into()))?;

        let Some(product) = state.products.get_mut(id) else {
            debug!(product_id = %id, "transfer for unknown product");
            return Ok(None);
        };

        let entry = product.apply_transfer(transfer, Utc::now())?;
        info!(
            product_id = %id,
            location = %entry.location,
            transferred_by = %entry.transferred_by,
            "transfer recorded"
        );
        Ok(Some(product.clone()))
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let state = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("product store read lock poisoned".into()))?;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        Ok(products)
    }
}
