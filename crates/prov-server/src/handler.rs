use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use prov_types::{CreateProductRequest, NewTransfer, Product, ProductId};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Landing handler.
pub async fn welcome_handler() -> Json<Value> {
    Json(json!({
        "message": "Product provenance API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_products(State(state): State<AppState>) -> ServerResult<Json<Vec<Product>>> {
    Ok(Json(state.client.list_products().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ServerResult<Json<Product>> {
    let id = ProductId::parse(product_id)?;
    Ok(Json(state.client.get_product_by_id(&id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<Product>)> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let product = match request.product_id {
        Some(id) => {
            state
                .client
                .create_product_with_id(id, request.descriptor)
                .await?
        }
        None => state.client.create_product(request.descriptor).await?,
    };
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn transfer_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    body: Result<Json<NewTransfer>, JsonRejection>,
) -> ServerResult<Json<Product>> {
    let id = ProductId::parse(product_id)?;
    let Json(transfer) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    Ok(Json(state.client.append_transfer(&id, transfer).await?))
}
