use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use minimart_core::{CurrencyCode, Price, ProductId};

use super::Record;

/// A sellable catalog item.
///
/// `category` is kept as stored text; it is validated on write, not on read,
/// so legacy rows with odd categories still list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Unit price in the store currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::PHP)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Record for Product {
    const TABLE: &'static str = "products";
}

/// Writable product columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: String,
    pub stock: i32,
    pub featured: bool,
}
