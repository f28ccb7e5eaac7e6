use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minimart_core::{CartItemId, ProductId, UserId};

use super::Record;

/// One (user, product) line in a cart. Unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for CartItem {
    const TABLE: &'static str = "cart_items";
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuantityPatch {
    pub quantity: i32,
}
