//! Transaction entity: recorded sales.
//!
//! A transaction references an existing buyer and product. The unit price
//! defaults to the product's current price, the total is always recomputed,
//! and status changes follow [`TransactionStatus::can_transition_to`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use minimart_backend::{Buyer, DataClient, Product, Table, Transaction, TransactionFields};
use minimart_core::{BuyerId, PaymentMethod, ProductId, TransactionId, TransactionStatus};

use super::crud::{CrudError, Entity, ValidationError};
use super::products::non_blank;

const fn one() -> i32 {
    1
}

/// Transaction form input.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInput {
    #[serde(default)]
    pub buyer_id: Option<BuyerId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default = "one")]
    pub quantity: i32,
    /// Defaults to the product's price.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
}

/// Input that passed the standalone checks.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub buyer_id: BuyerId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

fn parse_choice<T: std::str::FromStr>(
    errors: &mut ValidationError,
    field: &'static str,
    raw: Option<String>,
) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = non_blank(raw)?;
    raw.parse::<T>()
        .map_err(|e| errors.push(field, e.to_string()))
        .ok()
}

#[async_trait]
impl Entity for Transaction {
    type Id = TransactionId;
    type Input = TransactionInput;
    type Draft = TransactionDraft;
    type Fields = TransactionFields;

    const LABEL: &'static str = "transaction";

    fn id(&self) -> TransactionId {
        self.id
    }

    fn validate(input: TransactionInput) -> Result<TransactionDraft, ValidationError> {
        let mut errors = ValidationError::default();

        if input.buyer_id.is_none() {
            errors.push("buyer_id", "Select a buyer");
        }
        if input.product_id.is_none() {
            errors.push("product_id", "Select a product");
        }
        if input.quantity < 1 {
            errors.push("quantity", "Quantity must be at least 1");
        }
        if input.unit_price.is_some_and(|price| price <= Decimal::ZERO) {
            errors.push("unit_price", "Unit price must be greater than zero");
        }
        let status = parse_choice(&mut errors, "status", input.status);
        let payment_method = parse_choice(&mut errors, "payment_method", input.payment_method);

        let (Some(buyer_id), Some(product_id)) = (input.buyer_id, input.product_id) else {
            return Err(errors);
        };
        errors.into_result(TransactionDraft {
            buyer_id,
            product_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
            status,
            payment_method,
            notes: non_blank(input.notes),
            transaction_date: input.transaction_date,
        })
    }

    async fn resolve(
        draft: TransactionDraft,
        current: Option<&Self>,
        client: &dyn DataClient,
    ) -> Result<TransactionFields, CrudError> {
        let mut errors = ValidationError::default();

        if Table::<Buyer>::new(client)
            .get(draft.buyer_id)
            .await?
            .is_none()
        {
            errors.push("buyer_id", "Buyer does not exist");
        }
        let product = Table::<Product>::new(client).get(draft.product_id).await?;
        if product.is_none() {
            errors.push("product_id", "Product does not exist");
        }

        let status = draft
            .status
            .or(current.map(|c| c.status))
            .unwrap_or_default();
        if let Some(current) = current {
            if !current.status.can_transition_to(status) {
                let message = if current.status.is_terminal() {
                    format!("A {} transaction can no longer change status", current.status)
                } else {
                    format!("Cannot move a {} transaction to {status}", current.status)
                };
                errors.push("status", message);
            }
        }

        let product = match product {
            Some(product) if errors.is_empty() => product,
            _ => return Err(errors.into()),
        };

        // Keep the recorded price unless the product changed.
        let unit_price = draft
            .unit_price
            .or_else(|| {
                current
                    .filter(|c| c.product_id == Some(draft.product_id))
                    .map(|c| c.unit_price)
            })
            .unwrap_or(product.price);

        Ok(TransactionFields {
            buyer_id: draft.buyer_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
            unit_price,
            total_amount: unit_price * Decimal::from(draft.quantity),
            status,
            payment_method: draft
                .payment_method
                .or(current.map(|c| c.payment_method))
                .unwrap_or_default(),
            notes: draft.notes,
            transaction_date: draft
                .transaction_date
                .or(current.map(|c| c.transaction_date))
                .unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use minimart_backend::{BuyerFields, MemoryClient, ProductFields};
    use minimart_core::{BuyerStatus, Email};

    use super::*;
    use crate::services::crud::Crud;

    async fn seed(client: &MemoryClient) -> (Buyer, Product) {
        let buyer = Table::<Buyer>::new(client)
            .insert(&BuyerFields {
                name: "Juan dela Cruz".to_owned(),
                email: Email::parse("juan@example.ph").unwrap(),
                phone: None,
                address: None,
                status: BuyerStatus::Active,
                notes: None,
            })
            .await
            .unwrap();
        let product = Table::<Product>::new(client)
            .insert(&ProductFields {
                name: "Dried Mangoes".to_owned(),
                description: None,
                price: Decimal::new(4500, 2),
                image_url: None,
                category: "Dried Fruits".to_owned(),
                stock: 40,
                featured: true,
            })
            .await
            .unwrap();
        (buyer, product)
    }

    fn input(buyer: &Buyer, product: &Product) -> TransactionInput {
        TransactionInput {
            buyer_id: Some(buyer.id),
            product_id: Some(product.id),
            quantity: 3,
            unit_price: None,
            status: None,
            payment_method: None,
            notes: None,
            transaction_date: None,
        }
    }

    fn with_status(mut input: TransactionInput, status: &str) -> TransactionInput {
        input.status = Some(status.to_owned());
        input
    }

    #[test]
    fn test_validate_requires_buyer_product_and_quantity() {
        let errors = Transaction::validate(TransactionInput {
            buyer_id: None,
            product_id: None,
            quantity: 0,
            unit_price: Some(Decimal::ZERO),
            status: Some("shipped".to_owned()),
            payment_method: Some("barter".to_owned()),
            notes: None,
            transaction_date: None,
        })
        .unwrap_err();

        for field in [
            "buyer_id",
            "product_id",
            "quantity",
            "unit_price",
            "status",
            "payment_method",
        ] {
            assert!(errors.has(field), "{field} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_create_defaults_price_and_recomputes_total() {
        let client = MemoryClient::new();
        let (buyer, product) = seed(&client).await;

        let created = Crud::<Transaction>::new(&client)
            .create(input(&buyer, &product))
            .await
            .unwrap()
            .record;

        assert_eq!(created.unit_price, Decimal::new(4500, 2));
        assert_eq!(created.total_amount, Decimal::new(13500, 2));
        assert_eq!(created.status, TransactionStatus::Pending);
        assert_eq!(created.payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let client = MemoryClient::new();
        let (buyer, product) = seed(&client).await;
        let mut bad = input(&buyer, &product);
        bad.buyer_id = Some(BuyerId::generate());

        let result = Crud::<Transaction>::new(&client).create(bad).await;
        assert!(matches!(result, Err(CrudError::Validation(e)) if e.has("buyer_id")));
        assert_eq!(client.row_count("transactions").await, 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected_without_remote_call() {
        let client = MemoryClient::new();
        let (buyer, product) = seed(&client).await;
        let mut bad = input(&buyer, &product);
        bad.quantity = 0;
        let before = client.operation_count();

        let result = Crud::<Transaction>::new(&client).create(bad).await;
        assert!(matches!(result, Err(CrudError::Validation(_))));
        assert_eq!(client.operation_count(), before);
    }

    #[tokio::test]
    async fn test_status_transitions_on_update() {
        let client = MemoryClient::new();
        let (buyer, product) = seed(&client).await;
        let crud = Crud::<Transaction>::new(&client);
        let id = crud.create(input(&buyer, &product)).await.unwrap().record.id;

        let skip = crud
            .update(id, with_status(input(&buyer, &product), "completed"))
            .await;
        assert!(matches!(skip, Err(CrudError::Validation(e)) if e.has("status")));

        for next in ["processing", "completed", "completed"] {
            let updated = crud
                .update(id, with_status(input(&buyer, &product), next))
                .await
                .unwrap();
            assert_eq!(updated.record.status.as_str(), next);
        }

        let reopen = crud
            .update(id, with_status(input(&buyer, &product), "pending"))
            .await;
        let e = match reopen {
            Err(CrudError::Validation(e)) => e,
            other => panic!("expected a validation error, got {other:?}"),
        };
        assert_eq!(
            e.errors[0].message,
            "A completed transaction can no longer change status"
        );
    }

    #[tokio::test]
    async fn test_update_keeps_recorded_price_and_status() {
        let client = MemoryClient::new();
        let (buyer, product) = seed(&client).await;
        let crud = Crud::<Transaction>::new(&client);
        let mut first = with_status(input(&buyer, &product), "processing");
        first.unit_price = Some(Decimal::new(4000, 2));
        let id = crud.create(first).await.unwrap().record.id;

        let mut more = input(&buyer, &product);
        more.quantity = 5;
        let updated = crud.update(id, more).await.unwrap().record;

        assert_eq!(updated.unit_price, Decimal::new(4000, 2));
        assert_eq!(updated.total_amount, Decimal::new(20000, 2));
        assert_eq!(updated.status, TransactionStatus::Processing);
    }
}
