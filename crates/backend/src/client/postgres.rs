//! `PostgreSQL` implementation of [`DataClient`].
//!
//! Rows are exchanged as JSON: `to_jsonb(t)` on the way out and
//! `jsonb_populate_record` on the way in, so column types are resolved by
//! Postgres from the table definition. Table and column names are validated
//! and quoted before being spliced into SQL; values are always bound.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::instrument;

use super::{DataClient, Direction, Filter, Query, Row};
use crate::error::RepositoryError;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// [`DataClient`] backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgClient {
    pool: PgPool,
}

impl PgClient {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool (used by the session store and migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Validate and double-quote an identifier.
fn ident(name: &str) -> Result<String, RepositoryError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_start && valid_rest && name.len() <= 63 {
        Ok(format!("\"{name}\""))
    } else {
        Err(RepositoryError::InvalidQuery(format!(
            "invalid identifier: {name:?}"
        )))
    }
}

/// Quote a column name for use as a JSON key inside SQL (`'column'`).
fn json_key(name: &str) -> Result<String, RepositoryError> {
    ident(name).map(|_| format!("'{name}'"))
}

/// Append `WHERE ...` for `filters`, numbering placeholders from `binds.len() + 1`.
fn push_where(
    sql: &mut String,
    filters: &[Filter],
    binds: &mut Vec<Value>,
) -> Result<(), RepositoryError> {
    for (i, filter) in filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        let key = json_key(filter.column())?;
        match filter {
            Filter::Eq { value, .. } => {
                binds.push(value.clone());
                let _ = write!(sql, "(to_jsonb(t) -> {key}) = ${}", binds.len());
            }
            Filter::In { values, .. } => {
                binds.push(Value::Array(values.clone()));
                let _ = write!(
                    sql,
                    "(to_jsonb(t) -> {key}) IN (SELECT jsonb_array_elements(${}))",
                    binds.len()
                );
            }
        }
    }
    Ok(())
}

fn column_list(row: &Row) -> Result<Vec<String>, RepositoryError> {
    row.keys().map(|k| ident(k)).collect()
}

fn build_select(table: &str, query: &Query) -> Result<(String, Vec<Value>), RepositoryError> {
    let mut sql = format!("SELECT to_jsonb(t) AS row FROM {} AS t", ident(table)?);
    let mut binds = Vec::new();
    push_where(&mut sql, &query.filters, &mut binds)?;
    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        let _ = write!(sql, " ORDER BY t.{} {direction}", ident(&order.column)?);
    }
    if let Some(limit) = query.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    Ok((sql, binds))
}

fn build_insert(table: &str, row: &Row) -> Result<String, RepositoryError> {
    let table = ident(table)?;
    let columns = column_list(row)?;
    if columns.is_empty() {
        return Ok(format!(
            "INSERT INTO {table} AS t DEFAULT VALUES RETURNING to_jsonb(t) AS row"
        ));
    }
    let columns = columns.join(", ");
    Ok(format!(
        "INSERT INTO {table} AS t ({columns}) \
         SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
         RETURNING to_jsonb(t) AS row"
    ))
}

fn build_update(
    table: &str,
    patch: &Row,
    filters: &[Filter],
) -> Result<(String, Vec<Value>), RepositoryError> {
    if filters.is_empty() {
        return Err(RepositoryError::InvalidQuery(
            "refusing to update without a filter".to_owned(),
        ));
    }
    let table = ident(table)?;
    let assignments = column_list(patch)?
        .into_iter()
        .map(|c| format!("{c} = r.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    if assignments.is_empty() {
        return Err(RepositoryError::InvalidQuery("empty update".to_owned()));
    }

    let mut binds = vec![Value::Object(patch.clone())];
    let mut sql = format!(
        "UPDATE {table} AS t SET {assignments} \
         FROM jsonb_populate_record(NULL::{table}, $1) AS r"
    );
    push_where(&mut sql, filters, &mut binds)?;
    sql.push_str(" RETURNING to_jsonb(t) AS row");
    Ok((sql, binds))
}

fn build_delete(table: &str, filters: &[Filter]) -> Result<(String, Vec<Value>), RepositoryError> {
    if filters.is_empty() {
        return Err(RepositoryError::InvalidQuery(
            "refusing to delete without a filter".to_owned(),
        ));
    }
    let mut sql = format!("DELETE FROM {} AS t", ident(table)?);
    let mut binds = Vec::new();
    push_where(&mut sql, filters, &mut binds)?;
    Ok((sql, binds))
}

#[async_trait]
impl DataClient for PgClient {
    #[instrument(skip(self, query), fields(filters = query.filters.len()))]
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, RepositoryError> {
        let (sql, binds) = build_select(table, query)?;
        let mut q = sqlx::query_scalar::<_, Json<Row>>(&sql);
        for value in binds {
            q = q.bind(Json(value));
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    #[instrument(skip(self, row))]
    async fn insert(&self, table: &str, row: Row) -> Result<Row, RepositoryError> {
        let sql = build_insert(table, &row)?;
        let Json(stored) = sqlx::query_scalar::<_, Json<Row>>(&sql)
            .bind(Json(Value::Object(row)))
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    #[instrument(skip(self, patch, filters))]
    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, RepositoryError> {
        let (sql, binds) = build_update(table, &patch, filters)?;
        let mut q = sqlx::query_scalar::<_, Json<Row>>(&sql);
        for value in binds {
            q = q.bind(Json(value));
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    #[instrument(skip(self, filters))]
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, RepositoryError> {
        let (sql, binds) = build_delete(table, filters)?;
        let mut q = sqlx::query(&sql);
        for value in binds {
            q = q.bind(Json(value));
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
