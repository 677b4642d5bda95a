//! [`ProductStore`] over the provenance server's REST API.

use std::time::Duration;

use async_trait::async_trait;
use prov_store::{ProductStore, StoreError, StoreResult};
use prov_types::{CreateProductRequest, NewTransfer, Product, ProductId};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpStoreConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Product store backed by a remote provenance server.
///
/// Appends are serialized by the server; this client only forwards them.
/// Every record received is checked with [`Product::verify`] before it is
/// handed to the caller.
#[derive(Clone, Debug)]
pub struct HttpProductStore {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpProductStore {
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            StoreError::Backend(format!("invalid server URL {:?}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Backend(format!(
                "server URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<reqwest::Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout)
            } else {
                StoreError::Backend(format!("request failed: {e}"))
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("malformed response: {e}")))
    }

    async fn decode_product(response: reqwest::Response) -> StoreResult<Product> {
        let product: Product = Self::decode(response).await?;
        product.verify().map_err(|e| {
            StoreError::Backend(format!("server returned an inconsistent record: {e}"))
        })?;
        Ok(product)
    }

    /// Map an unexpected status to a store error, using the server's message.
    async fn failure(&self, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        match status {
            StatusCode::BAD_REQUEST => StoreError::Rejected(message),
            StatusCode::GATEWAY_TIMEOUT => StoreError::Timeout(self.timeout),
            _ => StoreError::Backend(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl ProductStore for HttpProductStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        let request = CreateProductRequest::from_product(&product);
        let url = self.url(&["api", "products"]);
        debug!(%url, product_id = %product.product_id, "creating remote product");
        let response = self.send(self.client.post(url).json(&request)).await?;
        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Self::decode_product(response).await,
            StatusCode::CONFLICT => Err(StoreError::Conflict(product.product_id)),
            _ => Err(self.failure(response).await),
        }
    }

    async fn find(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let url = self.url(&["api", "products", id.as_str()]);
        debug!(%url, "fetching remote product");
        let response = self.send(self.client.get(url)).await?;
        match response.status() {
            StatusCode::OK => Self::decode_product(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(self.failure(response).await),
        }
    }

    async fn push_transfer(
        &self,
        id: &ProductId,
        transfer: NewTransfer,
    ) -> StoreResult<Option<Product>> {
        let url = self.url(&["api", "products", id.as_str(), "transfer"]);
        debug!(%url, location = %transfer.location, "pushing remote transfer");
        let response = self.send(self.client.patch(url).json(&transfer)).await?;
        match response.status() {
            StatusCode::OK => Self::decode_product(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(self.failure(response).await),
        }
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let url = self.url(&["api", "products"]);
        let response = self.send(self.client.get(url)).await?;
        if response.status() != StatusCode::OK {
            return Err(self.failure(response).await);
        }
        let products: Vec<Product> = Self::decode(response).await?;
        for product in &products {
            product.verify().map_err(|e| {
                StoreError::Backend(format!(
                    "server returned an inconsistent record {}: {e}",
                    product.product_id
                ))
            })?;
        }
        Ok(products)
    }
}
