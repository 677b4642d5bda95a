use async_trait::async_trait;
use prov_types::{NewTransfer, Product, ProductId};

use crate::error::StoreResult;

/// Persistence boundary for product records.
///
/// Engines must serialize appends per product: the lookup, the
/// `currentLocation` update and the history push happen as one step, so
/// concurrent appends never lose an entry or interleave out of order.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. Fails with `Conflict` if the id is taken.
    async fn insert(&self, product: Product) -> StoreResult<Product>;

    async fn find(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// Atomically append a transfer and move the product with it.
    ///
    /// Returns `None` when no product has this id.
    async fn push_transfer(
        &self,
        id: &ProductId,
        transfer: NewTransfer,
    ) -> StoreResult<Option<Product>>;

    /// Every product, oldest first.
    async fn list(&self) -> StoreResult<Vec<Product>>;
}
