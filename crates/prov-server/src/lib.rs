//! HTTP server for tag-bound provenance.
//!
//! Exposes the provenance store over a small JSON REST API:
//!
//! | Method  | Path                               | Operation            |
//! |---------|------------------------------------|----------------------|
//! | `GET`   | `/`                                | welcome              |
//! | `GET`   | `/v1/health`                       | health               |
//! | `GET`   | `/api/products`                    | list products        |
//! | `POST`  | `/api/products`                    | create product       |
//! | `GET`   | `/api/products/:productId`         | get product by id    |
//! | `PATCH` | `/api/products/:productId/transfer`| append transfer      |
//!
//! Errors are returned as `{"message": "..."}` with 404 for unknown
//! products, 409 for id collisions, 400 for invalid input and 504 when the
//! store does not answer in time.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorBody, ServerError, ServerResult};
pub use server::ProvServer;
pub use state::AppState;
