//! In-process table store.
//!
//! Behaves like the hosted store for the purposes of the application: it
//! generates `id`, `created_at`, and `updated_at`, enforces unique
//! constraints, and can be switched offline to exercise failure paths.
//! Foreign keys are not enforced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{DataClient, Direction, Filter, Query, Row, compare_values};
use crate::error::RepositoryError;

/// Unique constraints matching `migrations/`.
const DEFAULT_UNIQUE: &[(&str, &[&str])] = &[
    ("users", &["email"]),
    ("cart_items", &["user_id", "product_id"]),
];

/// In-memory [`DataClient`] used by tests and local demos.
pub struct MemoryClient {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unique: Vec<(String, Vec<String>)>,
    last_timestamp: Mutex<DateTime<Utc>>,
    offline: AtomicBool,
    operations: AtomicUsize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Create an empty store with the schema's unique constraints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            unique: DEFAULT_UNIQUE
                .iter()
                .map(|(table, columns)| {
                    (
                        (*table).to_owned(),
                        columns.iter().map(|c| (*c).to_owned()).collect(),
                    )
                })
                .collect(),
            last_timestamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
            offline: AtomicBool::new(false),
            operations: AtomicUsize::new(0),
        }
    }

    /// Simulate losing (or regaining) the connection to the store.
    ///
    /// While offline every operation fails with [`RepositoryError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Number of operations attempted against this store, including failed ones.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.load(AtomicOrdering::SeqCst)
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }

    fn begin(&self) -> Result<(), RepositoryError> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store is offline".to_owned(),
            ));
        }
        Ok(())
    }

    /// Strictly increasing timestamps so `created_at` ordering is deterministic
    /// even for rows inserted within the same clock tick.
    async fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().await;
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        next
    }

    fn check_unique(
        &self,
        table: &str,
        rows: &[Row],
        candidate: &Row,
        skip_index: Option<usize>,
    ) -> Result<(), RepositoryError> {
        let id_constraint = vec!["id".to_owned()];
        let constraints = self
            .unique
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, columns)| columns)
            .chain(std::iter::once(&id_constraint));

        for columns in constraints {
            let key: Option<Vec<&Value>> = columns
                .iter()
                .map(|c| candidate.get(c).filter(|v| !v.is_null()))
                .collect();
            let Some(key) = key else { continue };

            let clash = rows.iter().enumerate().any(|(index, row)| {
                Some(index) != skip_index
                    && columns
                        .iter()
                        .zip(&key)
                        .all(|(column, value)| row.get(column) == Some(*value))
            });
            if clash {
                return Err(RepositoryError::Conflict(format!(
                    "duplicate key value violates unique constraint \"{table}_{}_key\"",
                    columns.join("_")
                )));
            }
        }
        Ok(())
    }
}

fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
}

fn require_filters(filters: &[Filter], operation: &str) -> Result<(), RepositoryError> {
    if filters.is_empty() {
        return Err(RepositoryError::InvalidQuery(format!(
            "refusing to {operation} without a filter"
        )));
    }
    Ok(())
}

#[async_trait]
impl DataClient for MemoryClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, RepositoryError> {
        self.begin()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, RepositoryError> {
        self.begin()?;
        let now = timestamp_value(self.next_timestamp().await);

        if row.get("id").is_none_or(Value::is_null) {
            row.insert("id".to_owned(), Value::String(Uuid::new_v4().to_string()));
        }
        for column in ["created_at", "updated_at"] {
            if row.get(column).is_none_or(Value::is_null) {
                row.insert(column.to_owned(), now.clone());
            }
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_owned()).or_default();
        self.check_unique(table, rows, &row, None)?;
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, RepositoryError> {
        self.begin()?;
        require_filters(filters, "update")?;
        let now = timestamp_value(self.next_timestamp().await);

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let matching: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filters.iter().all(|f| f.matches(row)))
            .map(|(index, _)| index)
            .collect();

        // Validate every change before applying any so a conflict leaves the table untouched.
        let mut updated = Vec::with_capacity(matching.len());
        for &index in &matching {
            let Some(current) = rows.get(index) else {
                continue;
            };
            let mut next = current.clone();
            for (column, value) in &patch {
                next.insert(column.clone(), value.clone());
            }
            if next.contains_key("updated_at") && !patch.contains_key("updated_at") {
                next.insert("updated_at".to_owned(), now.clone());
            }
            self.check_unique(table, rows, &next, Some(index))?;
            updated.push((index, next));
        }

        let mut result = Vec::with_capacity(updated.len());
        for (index, next) in updated {
            if let Some(slot) = rows.get_mut(index) {
                *slot = next.clone();
                result.push(next);
            }
        }
        Ok(result)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        self.begin()?;
        require_filters(filters, "delete")?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(u64::try_from(before - rows.len()).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.begin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_columns() {
        let client = MemoryClient::new();
        let stored = client
            .insert("products", row(json!({"name": "Chicharon"})))
            .await
            .unwrap();

        assert!(stored.get("id").and_then(Value::as_str).is_some());
        assert!(stored.contains_key("created_at"));
        assert!(stored.contains_key("updated_at"));
        assert_eq!(client.row_count("products").await, 1);
    }

    #[tokio::test]
    async fn test_insert_keeps_explicit_id() {
        let client = MemoryClient::new();
        let stored = client
            .insert("profiles", row(json!({"id": "fixed", "email": "a@b.co"})))
            .await
            .unwrap();
        assert_eq!(stored["id"], json!("fixed"));

        let duplicate = client
            .insert("profiles", row(json!({"id": "fixed", "email": "c@d.co"})))
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unique_cart_entry() {
        let client = MemoryClient::new();
        let entry = json!({"user_id": "u1", "product_id": "p1", "quantity": 1});
        client.insert("cart_items", row(entry.clone())).await.unwrap();

        let err = client.insert("cart_items", row(entry)).await.unwrap_err();
        assert!(err.is_conflict());

        // Same product, different user is fine.
        client
            .insert(
                "cart_items",
                row(json!({"user_id": "u2", "product_id": "p1", "quantity": 1})),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_select_order_and_limit() {
        let client = MemoryClient::new();
        for name in ["first", "second", "third"] {
            client
                .insert("products", row(json!({"name": name})))
                .await
                .unwrap();
        }

        let newest = client
            .select(
                "products",
                &Query::new()
                    .order_by("created_at", Direction::Descending)
                    .limit(2),
            )
            .await
            .unwrap();
        let names: Vec<_> = newest.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("third"), json!("second")]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let client = MemoryClient::new();
        let stored = client
            .insert("cart_items", row(json!({"user_id": "u1", "product_id": "p1", "quantity": 1})))
            .await
            .unwrap();
        let id = stored["id"].clone();

        let updated = client
            .update(
                "cart_items",
                row(json!({"quantity": 3})),
                &[Filter::eq("id", id.clone())],
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["quantity"], json!(3));
        assert_ne!(updated[0]["updated_at"], stored["updated_at"]);

        let removed = client
            .delete("cart_items", &[Filter::eq("id", id)])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(client.row_count("cart_items").await, 0);
    }

    #[tokio::test]
    async fn test_unfiltered_mutations_rejected() {
        let client = MemoryClient::new();
        assert!(matches!(
            client.delete("products", &[]).await,
            Err(RepositoryError::InvalidQuery(_))
        ));
        assert!(matches!(
            client.update("products", Row::new(), &[]).await,
            Err(RepositoryError::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn test_offline() {
        let client = MemoryClient::new();
        client.set_offline(true);
        assert!(matches!(
            client.select("products", &Query::new()).await,
            Err(RepositoryError::Unavailable(_))
        ));
        assert!(client.ping().await.is_err());

        client.set_offline(false);
        assert!(client.ping().await.is_ok());
        assert_eq!(client.operation_count(), 3);
    }
}
