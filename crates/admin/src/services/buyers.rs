//! Buyer entity and derived order statistics.
//!
//! Statistics are never stored. They are tallied from `transactions` each
//! time a buyer is read, skipping cancelled sales.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use minimart_backend::{Buyer, BuyerFields, DataClient, Query, Table, Transaction};
use minimart_core::{BuyerId, BuyerStatus, Email, TransactionStatus};

use super::crud::{Crud, CrudError, Entity, ValidationError};
use super::products::non_blank;

/// Buyer form input.
#[derive(Debug, Clone, Deserialize)]
pub struct BuyerInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[async_trait]
impl Entity for Buyer {
    type Id = BuyerId;
    type Input = BuyerInput;
    type Draft = BuyerFields;
    type Fields = BuyerFields;

    const LABEL: &'static str = "buyer";

    fn id(&self) -> BuyerId {
        self.id
    }

    fn validate(input: BuyerInput) -> Result<BuyerFields, ValidationError> {
        let mut errors = ValidationError::default();

        let name = input.name.trim().to_owned();
        if name.is_empty() {
            errors.push("name", "Name is required");
        }
        let email = Email::parse(&input.email).map_err(|e| errors.push("email", e.to_string()));
        let status = match input.status.as_deref().map(str::trim) {
            None | Some("") => Ok(BuyerStatus::default()),
            Some(raw) => raw
                .parse::<BuyerStatus>()
                .map_err(|e| errors.push("status", e.to_string())),
        };

        match (email, status) {
            (Ok(email), Ok(status)) => errors.into_result(BuyerFields {
                name,
                email,
                phone: non_blank(input.phone),
                address: non_blank(input.address),
                status,
                notes: non_blank(input.notes),
            }),
            _ => Err(errors),
        }
    }

    async fn resolve(
        draft: BuyerFields,
        _current: Option<&Self>,
        _client: &dyn DataClient,
    ) -> Result<BuyerFields, CrudError> {
        Ok(draft)
    }
}

/// Order statistics for one buyer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuyerStats {
    pub order_count: usize,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
}

impl BuyerStats {
    fn record(&mut self, transaction: &Transaction) {
        self.order_count += 1;
        self.total_spent += transaction.total_amount;
        self.last_order_date = self.last_order_date.max(Some(transaction.transaction_date));
    }

    /// Statistics per buyer over `transactions`. Cancelled sales and sales
    /// whose buyer was deleted are ignored.
    pub fn tally<'t>(
        transactions: impl IntoIterator<Item = &'t Transaction>,
    ) -> HashMap<BuyerId, Self> {
        let mut stats: HashMap<BuyerId, Self> = HashMap::new();
        for transaction in transactions {
            if transaction.status == TransactionStatus::Cancelled {
                continue;
            }
            if let Some(buyer_id) = transaction.buyer_id {
                stats.entry(buyer_id).or_default().record(transaction);
            }
        }
        stats
    }
}

/// A buyer together with their derived statistics.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerDetail {
    #[serde(flatten)]
    pub buyer: Buyer,
    #[serde(flatten)]
    pub stats: BuyerStats,
}

/// Every buyer with statistics, in list order.
///
/// # Errors
///
/// Returns `Repository` if either table cannot be read.
pub async fn list_with_stats(client: &dyn DataClient) -> Result<Vec<BuyerDetail>, CrudError> {
    let buyers = Crud::<Buyer>::new(client).list().await?;
    let transactions = Table::<Transaction>::new(client)
        .select_lenient(&Query::new())
        .await?;
    let mut stats = BuyerStats::tally(&transactions);

    Ok(buyers
        .into_iter()
        .map(|buyer| BuyerDetail {
            stats: stats.remove(&buyer.id).unwrap_or_default(),
            buyer,
        })
        .collect())
}

/// One buyer with statistics.
///
/// # Errors
///
/// Returns `NotFound` if no buyer has that id.
pub async fn detail(client: &dyn DataClient, id: BuyerId) -> Result<BuyerDetail, CrudError> {
    let buyer = Crud::<Buyer>::new(client).get(id).await?;
    let transactions = Table::<Transaction>::new(client)
        .select_lenient(&Query::new().eq("buyer_id", id))
        .await?;

    Ok(BuyerDetail {
        stats: BuyerStats::tally(&transactions)
            .remove(&id)
            .unwrap_or_default(),
        buyer,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use minimart_backend::MemoryClient;
    use minimart_core::{PaymentMethod, ProductId, TransactionId};

    use super::*;

    fn input() -> BuyerInput {
        BuyerInput {
            name: "Maria Santos".to_owned(),
            email: "maria@example.ph".to_owned(),
            phone: Some("0917 555 0101".to_owned()),
            address: None,
            status: None,
            notes: Some(String::new()),
        }
    }

    fn sale(buyer: BuyerId, total: i64, day: u32, status: TransactionStatus) -> Transaction {
        let date = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
        Transaction {
            id: TransactionId::generate(),
            buyer_id: Some(buyer),
            product_id: Some(ProductId::generate()),
            quantity: 1,
            unit_price: Decimal::new(total, 0),
            total_amount: Decimal::new(total, 0),
            status,
            payment_method: PaymentMethod::Cash,
            notes: None,
            transaction_date: date,
            created_at: date,
            updated_at: None,
        }
    }

    #[test]
    fn test_validate_defaults_status() {
        let fields = Buyer::validate(input()).unwrap();
        assert_eq!(fields.status, BuyerStatus::Active);
        assert_eq!(fields.email.as_str(), "maria@example.ph");
        assert!(fields.notes.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let bad = BuyerInput {
            name: String::new(),
            email: "not-an-email".to_owned(),
            status: Some("vip".to_owned()),
            ..input()
        };
        let errors = Buyer::validate(bad).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert!(errors.has("status"));
    }

    #[test]
    fn test_tally_skips_cancelled_and_orphaned() {
        let maria = BuyerId::generate();
        let mut orphan = sale(maria, 999, 1, TransactionStatus::Completed);
        orphan.buyer_id = None;
        let sales = [
            sale(maria, 100, 2, TransactionStatus::Completed),
            sale(maria, 50, 9, TransactionStatus::Pending),
            sale(maria, 500, 20, TransactionStatus::Cancelled),
            orphan,
        ];

        let stats = BuyerStats::tally(&sales);
        assert_eq!(stats.len(), 1);
        let maria_stats = stats.get(&maria).copied().unwrap();
        assert_eq!(maria_stats.order_count, 2);
        assert_eq!(maria_stats.total_spent, Decimal::new(150, 0));
        assert_eq!(
            maria_stats.last_order_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_detail_without_orders_has_zero_stats() {
        let client = MemoryClient::new();
        let created = Crud::<Buyer>::new(&client).create(input()).await.unwrap();

        let detail = detail(&client, created.record.id).await.unwrap();
        assert_eq!(detail.stats, BuyerStats::default());

        let listed = list_with_stats(&client).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().unwrap().stats.order_count, 0);
    }
}
