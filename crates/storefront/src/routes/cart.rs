//! Cart route handlers.
//!
//! Each visitor's cart lives in their session. A handler restores it through
//! the [`SessionCart`] extractor, applies one operation, and writes the new
//! snapshot back before answering with the cart and its order summary.

use axum::{Json, extract::State};
use bejaus_core::{Product, ProductId};
use bejaus_core::cart::Cart;
use bejaus_core::checkout::OrderSummary;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::SessionCart;
use crate::state::AppState;

/// Cart plus the totals shown next to it.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
    pub summary: OrderSummary,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let summary = OrderSummary::for_cart(&cart);
        Self { cart, summary }
    }
}

const fn default_quantity() -> u32 {
    1
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub selected_size: Option<String>,
}

/// Remove item request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub selected_size: Option<String>,
}

/// Current cart.
#[instrument(skip(cart))]
pub async fn show(cart: SessionCart) -> Json<CartResponse> {
    Json(cart.cart().clone().into())
}

/// Add a product to the cart.
///
/// Rejects unknown products, sold-out products, a missing or unknown size,
/// an unknown color, and quantities beyond the remaining stock.
#[instrument(skip(state, cart), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: SessionCart,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let product = purchasable(state.catalog(), &request.product_id)?;

    if request.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1.".to_string(),
        ));
    }

    match request.selected_size.as_deref() {
        None if product.requires_size() => {
            return Err(AppError::BadRequest("Please select a size.".to_string()));
        }
        Some(size) if !product.offers_size(size) => {
            return Err(AppError::BadRequest(format!(
                "{} is not available in size {size}.",
                product.name
            )));
        }
        _ => {}
    }

    if let Some(color) = request.selected_color.as_deref()
        && !product.offers_color(color)
    {
        return Err(AppError::BadRequest(format!(
            "{} is not available in {color}.",
            product.name
        )));
    }

    let in_cart = cart
        .cart()
        .find(&product.id, request.selected_size.as_deref())
        .map_or(0, |item| item.quantity);
    check_stock(product.stock_count, in_cart.saturating_add(request.quantity))?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );

    cart.engine_mut().add_item(
        product.clone(),
        request.quantity,
        request.selected_size,
        request.selected_color,
    );

    let cart = cart.save().await?;
    tracing::info!(item_count = cart.item_count(), "Added to cart");
    Ok(Json(cart.into()))
}

/// Set a line's quantity; zero removes the line.
///
/// A non-zero quantity is held to the same catalog and stock rules as
/// [`add`]. Zero always goes through so a line can be dropped after its
/// product leaves the catalog.
#[instrument(skip(state, cart), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn update(
    State(state): State<AppState>,
    mut cart: SessionCart,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartResponse>> {
    if request.quantity > 0 {
        let product = purchasable(state.catalog(), &request.product_id)?;
        check_stock(product.stock_count, request.quantity)?;
    }

    cart.engine_mut().update_quantity(
        request.product_id,
        request.quantity,
        request.selected_size,
    );

    let cart = cart.save().await?;
    Ok(Json(cart.into()))
}

/// Remove a line.
#[instrument(skip(cart), fields(product_id = %request.product_id))]
pub async fn remove(
    mut cart: SessionCart,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartResponse>> {
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", request.product_id.as_str())]),
    );

    cart.engine_mut()
        .remove_item(request.product_id, request.selected_size);

    let cart = cart.save().await?;
    Ok(Json(cart.into()))
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(mut cart: SessionCart) -> Result<Json<CartResponse>> {
    cart.engine_mut().clear();
    let cart = cart.save().await?;
    Ok(Json(cart.into()))
}

/// Look up a product that can still be put in the cart.
fn purchasable<'a>(catalog: &'a Catalog, id: &ProductId) -> Result<&'a Product> {
    let product = catalog
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))?;
    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock.",
            product.name
        )));
    }
    Ok(product)
}

/// Reject a line quantity above the known stock.
fn check_stock(stock: Option<u32>, wanted: u32) -> Result<()> {
    match stock {
        Some(stock) if wanted > stock => Err(AppError::BadRequest(format!(
            "Only {stock} left in stock."
        ))),
        _ => Ok(()),
    }
}
