use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::extract::Payload;
use crate::{
    error::{AppError, AppResult},
    models::{CreateProduct, ListQuery, Product, ProductFilter, UpdateProduct},
    AppState,
};

/// A path id that is not a UUID cannot name any product.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Product not found".to_string()))
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Product>>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let filter = ProductFilter::try_from(query)?;

    let start = Instant::now();
    let products = state.store.find(&filter).await?;

    info!(
        count = products.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Listed products"
    );

    Ok(Json(products))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    Payload(payload): Payload<CreateProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let new_product = payload.validate()?;

    let start = Instant::now();
    let product = state
        .store
        .create(&new_product)
        .await
        .map_err(AppError::into_rejected_write)?;

    info!(
        id = %product.id,
        name = %product.name,
        elapsed_ms = start.elapsed().as_millis(),
        "Created product"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(payload): Payload<UpdateProduct>,
) -> AppResult<Json<Product>> {
    let id = parse_id(&id)?;
    let changes = payload.validate()?;

    let start = Instant::now();
    let product = state
        .store
        .update_by_id(id, &changes)
        .await
        .map_err(AppError::into_rejected_write)?;

    info!(id = %id, elapsed_ms = start.elapsed().as_millis(), "Updated product");

    Ok(Json(product))
}

// ── Delete ────────────────────────────────────────────────────────────────────

/// Only products with no stock left may be removed.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;

    let product = state.store.find_by_id(id).await?;
    if product.in_stock() {
        return Err(AppError::BadRequest("Product still in stock".to_string()));
    }

    state.store.delete_by_id(id).await?;

    info!(id = %id, name = %product.name, "Deleted product");

    Ok(Json(json!({ "message": "Product deleted" })))
}
