use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use minimart_core::{BuyerId, PaymentMethod, ProductId, TransactionId, TransactionStatus};

use super::Record;

/// A recorded sale.
///
/// `buyer_id` and `product_id` become null when the referenced row is
/// deleted, so history survives catalog and directory clean-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub buyer_id: Option<BuyerId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Transaction {
    const TABLE: &'static str = "transactions";
}

/// Writable transaction columns. `total_amount` is always `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFields {
    pub buyer_id: BuyerId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
}
