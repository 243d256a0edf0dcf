//! Square Connect API wire types (snake_case JSON).

use serde::{Deserialize, Serialize};

/// Amount in minor units plus ISO currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

/// Body of `POST /v2/payments`.
#[derive(Debug, Serialize)]
pub struct CreatePaymentBody<'a> {
    pub source_id: &'a str,
    pub idempotency_key: String,
    pub amount_money: Money,
    pub location_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_email_address: Option<&'a str>,
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentResponse {
    pub payment: Option<Payment>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub amount_money: Option<Money>,
}

/// One entry of Square's `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Envelope carrying only `errors`, for non-success responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// Response of `GET /v2/catalog/list`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogListResponse {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub id: String,
    #[serde(default)]
    pub item_data: Option<ItemData>,
    #[serde(default)]
    pub image_data: Option<ImageData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub image_ids: Vec<String>,
    #[serde(default)]
    pub variations: Vec<CatalogVariation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageData {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogVariation {
    #[serde(default)]
    pub item_variation_data: Option<VariationData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariationData {
    #[serde(default)]
    pub price_money: Option<Money>,
}
