//! Remote data client.
//!
//! Every component talks to the table store through the four capabilities of
//! [`DataClient`]. Rows are JSON objects keyed by column name so the same
//! calling code runs against `PostgreSQL` ([`PgClient`]) and the in-process
//! store used by tests ([`MemoryClient`]).
//!
//! # Example
//!
//! ```rust,ignore
//! let rows = client
//!     .select("cart_items", &Query::new().eq("user_id", user_id))
//!     .await?;
//! ```

mod memory;
mod postgres;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RepositoryError;

pub use memory::MemoryClient;
pub use postgres::{PgClient, create_pool};

/// A table row: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Query/mutation interface to the hosted table store.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Fetch rows matching every filter in `query`, in the requested order.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, RepositoryError>;

    /// Insert one row and return it as stored (with generated columns filled in).
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RepositoryError>;

    /// Apply `patch` to every row matching `filters` and return the updated rows.
    ///
    /// An empty filter list is rejected rather than updating the whole table.
    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, RepositoryError>;

    /// Delete every row matching `filters` and return how many were removed.
    ///
    /// An empty filter list is rejected rather than truncating the table.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Row predicate on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value.
    Eq { column: String, value: Value },
    /// Column equals any of the values.
    In { column: String, values: Vec<Value> },
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column IN (values)`
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Column this filter applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }

    /// Whether `row` satisfies this filter. A missing column never matches.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(self.column()) else {
            return false;
        };
        match self {
            Self::Eq { value, .. } => values_equal(actual, value),
            Self::In { values, .. } => values.iter().any(|v| values_equal(actual, v)),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A select request: filters (ANDed), optional ordering, optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl Query {
    /// Match every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Add a membership filter.
    #[must_use]
    pub fn is_in<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::is_in(column, values));
        self
    }

    /// Sort by `column`.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Column values compare equal if they are equal JSON, or both numbers with the
/// same numeric value (`2` and `2.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

/// Total order over column values used when sorting rows.
///
/// Nulls (and missing columns) sort last in ascending order. Strings that
/// parse as RFC 3339 timestamps are compared chronologically so that
/// differing fractional-second precision does not break `created_at` order.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
