//! Typed records for each table.
//!
//! # Tables
//!
//! - `products` - Sellable catalog items ([`Product`])
//! - `cart_items` - Per-user cart entries ([`CartItem`])
//! - `buyers` - Back-office buyer directory ([`Buyer`])
//! - `transactions` - Recorded sales ([`Transaction`])
//! - `profiles` - Display name and role per identity ([`Profile`])
//! - `users` - Password credentials behind the identity provider ([`UserRow`])
//!
//! [`Table`] adapts the untyped [`DataClient`] to one record type.

mod buyer;
mod cart_item;
mod product;
mod profile;
mod transaction;

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{DataClient, Filter, Query, Row};
use crate::error::RepositoryError;

pub use buyer::{Buyer, BuyerFields};
pub use cart_item::{CartItem, NewCartItem, QuantityPatch};
pub use product::{Product, ProductFields};
pub use profile::{NewProfile, NewUser, Profile, UserRow};
pub use transaction::{Transaction, TransactionFields};

/// A row type stored in a named table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table name in the store.
    const TABLE: &'static str;
}

/// Typed view of one table over a [`DataClient`].
pub struct Table<'a, R> {
    client: &'a dyn DataClient,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Table<'_, R> {}

/// Serialize a value into a row.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidQuery` if `value` does not serialize to a
/// JSON object.
pub fn to_row<T: Serialize + ?Sized>(value: &T) -> Result<Row, RepositoryError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(RepositoryError::InvalidQuery(format!(
            "expected an object row, got {other}"
        ))),
    }
}

impl<'a, R: Record> Table<'a, R> {
    #[must_use]
    pub fn new(client: &'a dyn DataClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    fn decode(row: Row) -> Result<R, RepositoryError> {
        serde_json::from_value(Value::Object(row)).map_err(|e| {
            RepositoryError::DataCorruption(format!("{} row: {e}", R::TABLE))
        })
    }

    /// Fetch rows; any row that fails to decode fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or `DataCorruption` for an undecodable row.
    pub async fn select(&self, query: &Query) -> Result<Vec<R>, RepositoryError> {
        self.client
            .select(R::TABLE, query)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Fetch rows, skipping (and logging) any that fail to decode.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn select_lenient(&self, query: &Query) -> Result<Vec<R>, RepositoryError> {
        let rows = self.client.select(R::TABLE, query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match Self::decode(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(table = R::TABLE, error = %e, "Skipping malformed row");
                    None
                }
            })
            .collect())
    }

    /// First row matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or `DataCorruption` for an undecodable row.
    pub async fn find(&self, query: Query) -> Result<Option<R>, RepositoryError> {
        let mut rows = self
            .client
            .select(R::TABLE, &query.limit(1))
            .await?
            .into_iter();
        rows.next().map(Self::decode).transpose()
    }

    /// Row with the given `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns the client's error, or `DataCorruption` for an undecodable row.
    pub async fn get(&self, id: impl Into<Value> + Send) -> Result<Option<R>, RepositoryError> {
        self.find(Query::new().eq("id", id)).await
    }

    /// Insert a row built from `fields`.
    ///
    /// # Errors
    ///
    /// Returns the client's error (`Conflict` on a unique violation).
    pub async fn insert<F: Serialize + Sync + ?Sized>(
        &self,
        fields: &F,
    ) -> Result<R, RepositoryError> {
        let row = to_row(fields)?;
        Self::decode(self.client.insert(R::TABLE, row).await?)
    }

    /// Apply `patch` to every row matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn update<P: Serialize + Sync + ?Sized>(
        &self,
        patch: &P,
        filters: &[Filter],
    ) -> Result<Vec<R>, RepositoryError> {
        let patch = to_row(patch)?;
        self.client
            .update(R::TABLE, patch, filters)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Apply `patch` to the row with the given `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row has that id.
    pub async fn update_by_id<P: Serialize + Sync + ?Sized>(
        &self,
        id: impl Into<Value> + Send,
        patch: &P,
    ) -> Result<R, RepositoryError> {
        self.update(patch, &[Filter::eq("id", id)])
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete every row matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn delete(&self, filters: &[Filter]) -> Result<u64, RepositoryError> {
        self.client.delete(R::TABLE, filters).await
    }

    /// Delete the row with the given `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row has that id.
    pub async fn delete_by_id(&self, id: impl Into<Value> + Send) -> Result<(), RepositoryError> {
        match self.delete(&[Filter::eq("id", id)]).await? {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::client::{Direction, MemoryClient};

    fn chips() -> ProductFields {
        ProductFields {
            name: "Banana Chips".to_owned(),
            description: Some("Crispy".to_owned()),
            price: Decimal::new(1500, 2),
            image_url: None,
            category: "Chips".to_owned(),
            stock: 75,
            featured: true,
        }
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let client = MemoryClient::new();
        let products = Table::<Product>::new(&client);

        let created = products.insert(&chips()).await.unwrap();
        assert_eq!(created.name, "Banana Chips");
        assert_eq!(created.price, Decimal::new(1500, 2));

        let fetched = products.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        let mut fields = chips();
        fields.stock = 10;
        let updated = products.update_by_id(created.id, &fields).await.unwrap();
        assert_eq!(updated.stock, 10);

        products.delete_by_id(created.id).await.unwrap();
        assert!(products.get(created.id).await.unwrap().is_none());
        assert!(matches!(
            products.delete_by_id(created.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_lenient_select_skips_malformed_rows() {
        let client = Arc::new(MemoryClient::new());
        let products = Table::<Product>::new(client.as_ref());
        products.insert(&chips()).await.unwrap();
        client
            .insert("products", to_row(&json!({"description": "no name"})).unwrap())
            .await
            .unwrap();

        let lenient = products
            .select_lenient(&Query::new().order_by("created_at", Direction::Descending))
            .await
            .unwrap();
        assert_eq!(lenient.len(), 1);

        let strict = products.select(&Query::new()).await;
        assert!(matches!(strict, Err(RepositoryError::DataCorruption(_))));
    }

    fn product_row(price: &str) -> Row {
        let text = format!(
            r#"{{"id": "6f1c2a3e-8b4d-4c5e-9f60-7a8b9c0d1e2f", "name": "Polvoron",
                "category": "Sweets", "created_at": "2024-06-01T08:00:00Z"{price}}}"#
        );
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_numeric_columns_keep_their_scale() {
        let polvoron = Table::<Product>::decode(product_row(r#", "price": 25.00"#)).unwrap();
        assert_eq!(polvoron.price.scale(), 2);
        assert_eq!(polvoron.price.to_string(), "25.00");

        let precise =
            Table::<Product>::decode(product_row(r#", "price": 12345678901234.5678"#)).unwrap();
        assert_eq!(precise.price, Decimal::new(123_456_789_012_345_678, 4));
    }

    #[tokio::test]
    async fn test_product_without_price_is_malformed() {
        let client = Arc::new(MemoryClient::new());
        let products = Table::<Product>::new(client.as_ref());
        products.insert(&chips()).await.unwrap();
        client.insert("products", product_row("")).await.unwrap();

        assert!(matches!(
            Table::<Product>::decode(product_row("")),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert_eq!(products.select_lenient(&Query::new()).await.unwrap().len(), 1);
        assert!(products.select(&Query::new()).await.is_err());
    }

    #[test]
    fn test_to_row_rejects_non_objects() {
        assert!(to_row(&json!([1, 2])).is_err());
        assert!(to_row(&json!({"a": 1})).is_ok());
    }
}
