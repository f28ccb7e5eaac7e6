use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minimart_core::{BuyerId, BuyerStatus, Email};

use super::Record;

/// Back-office buyer record.
///
/// Order statistics are not stored here; they are derived from
/// `transactions` whenever a buyer is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: BuyerStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Buyer {
    const TABLE: &'static str = "buyers";
}

/// Writable buyer columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerFields {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: BuyerStatus,
    pub notes: Option<String>,
}
