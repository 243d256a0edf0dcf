//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bejaus_core::{Product, ProductId};
use tracing::instrument;

use crate::catalog::CatalogQuery;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products, optionally filtered by category and sorted.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Product>> {
    Json(state.catalog().list(&query))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    state
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))
}
