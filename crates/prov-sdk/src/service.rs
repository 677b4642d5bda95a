use std::sync::Arc;

use prov_store::ProvenanceClient;
use prov_tag::{DriverError, ReadOutcome, TagError, TagHandle, TagOrchestrator};
use prov_types::{NewProductDescriptor, NewTransfer, Product, ProductId};
use tracing::{info, warn};

use crate::error::SdkResult;

/// A product freshly bound to a tag.
#[derive(Clone, Debug)]
pub struct BoundProduct {
    pub product: Product,
    pub tag: TagHandle,
    /// True if either tag step was served by the simulator.
    pub simulated: bool,
}

/// A tag read and the product it points at.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub read: ReadOutcome,
    pub product: Product,
}

/// Composes tag I/O with the provenance store.
#[derive(Clone)]
pub struct ProvenanceService {
    tags: Arc<TagOrchestrator>,
    products: ProvenanceClient,
}

impl ProvenanceService {
    pub fn new(tags: Arc<TagOrchestrator>, products: ProvenanceClient) -> Self {
        Self { tags, products }
    }

    pub fn tags(&self) -> &Arc<TagOrchestrator> {
        &self.tags
    }

    pub fn products(&self) -> &ProvenanceClient {
        &self.products
    }

    /// Bind a new product to the tag presented next.
    ///
    /// The tag is read, the new id is written to it, and only then is the
    /// record created, seeded at its origin. A failed tag step leaves no
    /// record behind.
    pub async fn bind_new_product(&self, descriptor: NewProductDescriptor) -> SdkResult<BoundProduct> {
        descriptor.validate()?;
        let id = ProductId::generate();

        let read = self.tags.read().await?;
        if !read.simulated {
            info!(tag = %read.tag.id, previous = %read.identifier, "tag presented for binding");
        }
        let written = self.tags.write_text(id.as_str()).await?;
        if !read.simulated && !written.simulated && written.tag.id != read.tag.id {
            warn!(
                product_id = %id,
                read = %read.tag.id,
                written = %written.tag.id,
                "id written to a different tag than the one read"
            );
            return Err(TagError::from(DriverError::TagSwapped {
                expected: read.tag.id,
                presented: written.tag.id,
            })
            .into());
        }

        let product = self
            .products
            .create_product_with_id(id.clone(), descriptor)
            .await
            .inspect_err(|e| {
                warn!(product_id = %id, error = %e, "tag written but product record not created");
            })?;

        info!(
            product_id = %product.product_id,
            tag = %written.tag.id,
            simulated = read.simulated || written.simulated,
            "product bound to tag"
        );
        Ok(BoundProduct {
            product,
            tag: written.tag,
            simulated: read.simulated || written.simulated,
        })
    }

    /// Create a product under the identifier a tag already carries.
    ///
    /// For pre-printed codes and read-only tags: nothing is written, the
    /// scanned identifier becomes the product id. Simulated reads are
    /// refused, since their identifiers are not printed anywhere.
    pub async fn adopt_tag(&self, descriptor: NewProductDescriptor) -> SdkResult<BoundProduct> {
        descriptor.validate()?;

        let read = self.tags.read().await?;
        if read.simulated {
            return Err(TagError::CapabilityUnavailable.into());
        }
        let id = ProductId::parse(&read.identifier)?;
        let product = self.products.create_product_with_id(id, descriptor).await?;

        info!(product_id = %product.product_id, tag = %read.tag.id, "product adopted tag identifier");
        Ok(BoundProduct {
            product,
            tag: read.tag,
            simulated: false,
        })
    }

    /// Read the tag presented next and fetch the product it names.
    pub async fn resolve_tag(&self) -> SdkResult<Resolution> {
        let read = self.tags.read().await?;
        let id = ProductId::parse(&read.identifier)?;
        let product = self.products.get_product_by_id(&id).await?;
        Ok(Resolution { read, product })
    }

    /// Fetch a product by an id typed in by hand.
    pub async fn resolve_manual(&self, raw_id: &str) -> SdkResult<Product> {
        let id = ProductId::parse(raw_id)?;
        Ok(self.products.get_product_by_id(&id).await?)
    }

    pub async fn record_transfer(&self, id: &ProductId, transfer: NewTransfer) -> SdkResult<Product> {
        Ok(self.products.append_transfer(id, transfer).await?)
    }

    pub async fn list_products(&self) -> SdkResult<Vec<Product>> {
        Ok(self.products.list_products().await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use prov_store::{ClientConfig, InMemoryProductStore};
    use prov_tag::{Fault, Payload, ScriptedDriver, TagConfig, TagId, UnavailableDriver};

    use super::*;
    use crate::error::{ErrorKind, SdkError};

    fn descriptor() -> NewProductDescriptor {
        NewProductDescriptor::new(
            "Organic Apples",
            "Green Valley Farm",
            "BATCH-2024-09",
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        )
        .with_creator("Farmer App User")
    }

    fn service(driver: Arc<dyn prov_tag::TagDriver>) -> ProvenanceService {
        let tags = Arc::new(TagOrchestrator::new(driver, TagConfig::default()));
        let products = ProvenanceClient::new(
            Arc::new(InMemoryProductStore::new()),
            ClientConfig::default(),
        );
        ProvenanceService::new(tags, products)
    }

    #[tokio::test]
    async fn bind_writes_id_then_resolves_from_tag() {
        let uid = TagId::from(vec![0x04, 0xa2, 0x3f, 0x19]);
        let driver = Arc::new(ScriptedDriver::new().with_tag(uid.clone(), Payload::NotEncoded));
        let service = service(driver.clone());

        driver.present_tag(uid.clone());
        driver.present_tag(uid.clone());
        let bound = service.bind_new_product(descriptor()).await.unwrap();
        assert!(!bound.simulated);
        assert_eq!(bound.tag.id, uid);
        assert_eq!(bound.product.current_location(), "Green Valley Farm");

        driver.present_tag(uid);
        let resolved = service.resolve_tag().await.unwrap();
        assert_eq!(resolved.product, bound.product);
        assert_eq!(resolved.read.identifier, bound.product.product_id.as_str());
        assert_eq!(driver.releases(), 3);
    }

    #[tokio::test]
    async fn unavailable_capability_binds_with_simulated_tag() {
        let service = service(Arc::new(UnavailableDriver));

        let bound = service.bind_new_product(descriptor()).await.unwrap();
        assert!(bound.simulated);
        assert_eq!(bound.product.transfer_history().len(), 1);
        assert_eq!(service.list_products().await.unwrap().len(), 1);

        let err = service.resolve_tag().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.offers_manual_entry());

        let manual = service
            .resolve_manual(bound.product.product_id.as_str())
            .await
            .unwrap();
        assert_eq!(manual, bound.product);
    }

    #[tokio::test]
    async fn failed_write_creates_nothing() {
        let uid = TagId::from(vec![0x04, 0x01]);
        let driver = Arc::new(ScriptedDriver::new().with_tag(uid.clone(), Payload::NotEncoded));
        let service = service(driver.clone());

        driver.present_tag(uid.clone());
        driver.present_tag(uid);
        driver.fail_next_write(Fault::Fail(DriverError::TagLost));

        let err = service.bind_new_product(descriptor()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverError);
        assert!(err.is_retryable());
        assert!(service.list_products().await.unwrap().is_empty());
        assert_eq!(driver.releases(), 2);
    }

    #[tokio::test]
    async fn swapped_tag_between_read_and_write_creates_nothing() {
        let first = TagId::from(vec![0x0a]);
        let second = TagId::from(vec![0x0b]);
        let driver = Arc::new(
            ScriptedDriver::new()
                .with_tag(first.clone(), Payload::NotEncoded)
                .with_tag(second.clone(), Payload::NotEncoded),
        );
        let service = service(driver.clone());

        driver.present_tag(first.clone());
        driver.present_tag(second.clone());
        let err = service.bind_new_product(descriptor()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DriverError);
        match err {
            SdkError::Tag(TagError::Driver(DriverError::TagSwapped { expected, presented })) => {
                assert_eq!(expected, first);
                assert_eq!(presented, second);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.list_products().await.unwrap().is_empty());
        assert_eq!(driver.releases(), 2);
    }

    #[tokio::test]
    async fn invalid_descriptor_never_touches_the_tag() {
        let driver = Arc::new(ScriptedDriver::new());
        let service = service(driver.clone());

        let mut bad = descriptor();
        bad.product_name = String::new();
        let err = service.bind_new_product(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(driver.releases(), 0);
        assert!(driver.written().is_empty());
    }

    #[tokio::test]
    async fn adopting_a_printed_code_uses_it_as_id() {
        let code = TagId::from(&b"LBL-000417"[..]);
        let driver = Arc::new(
            ScriptedDriver::new().with_tag(code.clone(), Payload::Text("LBL-000417".into())),
        );
        let service = service(driver.clone());

        driver.present_tag(code.clone());
        let bound = service.adopt_tag(descriptor()).await.unwrap();
        assert_eq!(bound.product.product_id.as_str(), "LBL-000417");
        assert!(driver.written().is_empty());

        driver.present_tag(code);
        let err = service.adopt_tag(descriptor()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn adopting_requires_a_real_tag() {
        let service = service(Arc::new(UnavailableDriver));
        let err = service.adopt_tag(descriptor()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tag_offers_manual_entry() {
        let uid = TagId::from(vec![0x04, 0xee]);
        let driver = Arc::new(ScriptedDriver::new().with_tag(uid.clone(), Payload::NotEncoded));
        let service = service(driver.clone());

        driver.present_tag(uid);
        let err = service.resolve_tag().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.offers_manual_entry());
        assert!(err.to_string().contains("04EE"));
    }

    #[tokio::test(start_paused = true)]
    async fn no_tag_is_retryable_timeout() {
        let service = service(Arc::new(ScriptedDriver::new()));
        let err = service.resolve_tag().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagTimeout);
        assert!(err.is_retryable());
        assert!(!err.offers_manual_entry());
    }

    #[tokio::test]
    async fn transfers_follow_custody() {
        let service = service(Arc::new(UnavailableDriver));
        let bound = service.bind_new_product(descriptor()).await.unwrap();
        let id = bound.product.product_id;

        service
            .record_transfer(&id, NewTransfer::new("Distribution Center", "Truck 12"))
            .await
            .unwrap();
        let product = service
            .record_transfer(&id, NewTransfer::new("Retail Store", "Store Clerk"))
            .await
            .unwrap();

        assert_eq!(product.current_location(), "Retail Store");
        assert_eq!(product.transfer_history().len(), 3);
        product.verify().unwrap();

        let err = service
            .record_transfer(&id, NewTransfer::new("Retail Store", " "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
}
