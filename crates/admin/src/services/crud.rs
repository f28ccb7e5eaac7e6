//! Generic create/read/update/delete over one admin entity.
//!
//! Each entity describes its table, list order, and validation through
//! [`Entity`]; [`Crud`] runs the same flow for all of them:
//!
//! 1. `validate` the raw input (pure, no remote calls)
//! 2. `resolve` it against the store (lookups only, no writes)
//! 3. write
//! 4. re-fetch the full list for the caller
//!
//! A failed re-fetch does not undo the write. The [`Mutation`] carries
//! [`Listing::Stale`] instead so the caller can show the record it just saved
//! next to a warning.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use minimart_backend::{DataClient, Direction, Query, Record, RepositoryError, Table};

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Input rejected before anything was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// A validation error for one field.
    #[must_use]
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.push(field, message);
        error
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `field` was rejected.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was rejected.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field was rejected.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors from a CRUD operation.
#[derive(Debug, Error)]
pub enum CrudError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An admin-managed record type.
#[async_trait]
pub trait Entity: Record + Clone + 'static {
    /// Primary key.
    type Id: Copy + fmt::Display + Into<Value> + Serialize + Send + Sync;
    /// Raw form input.
    type Input: Send + Sync;
    /// Input that passed [`Entity::validate`].
    type Draft: Send + Sync;
    /// Columns written to the store.
    type Fields: Serialize + Send + Sync;

    /// Human-readable name used in messages and logs.
    const LABEL: &'static str;
    const ORDER_BY: &'static str = "created_at";
    const DIRECTION: Direction = Direction::Descending;

    fn id(&self) -> Self::Id;

    /// Check the input on its own. Must not touch the store.
    ///
    /// # Errors
    ///
    /// Returns every rejected field.
    fn validate(input: Self::Input) -> Result<Self::Draft, ValidationError>;

    /// Turn a validated draft into the columns to write, looking up whatever
    /// the entity depends on. `current` is the stored row on update.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when a dependency is missing or a change is not
    /// allowed, `Repository` when a lookup fails.
    async fn resolve(
        draft: Self::Draft,
        current: Option<&Self>,
        client: &dyn DataClient,
    ) -> Result<Self::Fields, CrudError>;
}

/// The list as seen after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Listing<E> {
    /// Re-fetched after the write.
    Fresh { items: Vec<E> },
    /// The write went through but the re-fetch failed.
    Stale { error: String },
}

impl<E> Listing<E> {
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Items when fresh.
    #[must_use]
    pub fn items(&self) -> Option<&[E]> {
        match self {
            Self::Fresh { items } => Some(items),
            Self::Stale { .. } => None,
        }
    }
}

/// Outcome of a create, update, or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation<T, E> {
    /// The written record (or the removed id).
    pub record: T,
    pub listing: Listing<E>,
}

/// Proof that a deletion was explicitly confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    #[must_use]
    pub const fn confirmed() -> Self {
        Self(())
    }

    /// `Some` only when `confirmed` is set.
    #[must_use]
    pub const fn from_flag(confirmed: bool) -> Option<Self> {
        if confirmed { Some(Self(())) } else { None }
    }
}

/// CRUD operations for one entity over a data client.
pub struct Crud<'a, E> {
    client: &'a dyn DataClient,
    table: Table<'a, E>,
}

impl<'a, E: Entity> Crud<'a, E> {
    #[must_use]
    pub fn new(client: &'a dyn DataClient) -> Self {
        Self {
            client,
            table: Table::new(client),
        }
    }

    fn not_found(id: E::Id) -> CrudError {
        CrudError::NotFound {
            entity: E::LABEL,
            id: id.to_string(),
        }
    }

    fn missing_as_not_found(id: E::Id) -> impl FnOnce(RepositoryError) -> CrudError {
        move |err| match err {
            RepositoryError::NotFound => Self::not_found(id),
            other => other.into(),
        }
    }

    /// Every row in list order.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the select fails or a row does not decode.
    pub async fn list(&self) -> Result<Vec<E>, CrudError> {
        let query = Query::new().order_by(E::ORDER_BY, E::DIRECTION);
        Ok(self.table.select(&query).await?)
    }

    /// One row by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row has that id.
    pub async fn get(&self, id: E::Id) -> Result<E, CrudError> {
        self.table.get(id).await?.ok_or_else(|| Self::not_found(id))
    }

    /// Validate and insert a new row.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without touching the store if the input is
    /// rejected, `Repository` if the insert fails.
    #[instrument(skip_all, fields(entity = E::LABEL))]
    pub async fn create(&self, input: E::Input) -> Result<Mutation<E, E>, CrudError> {
        let draft = E::validate(input)?;
        let fields = E::resolve(draft, None, self.client).await?;
        let record = self.table.insert(&fields).await?;
        tracing::info!(id = %record.id(), "Created {}", E::LABEL);

        Ok(Mutation {
            record,
            listing: self.refresh().await,
        })
    }

    /// Validate and overwrite an existing row.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without touching the store if the input is
    /// rejected, `NotFound` if the row is gone.
    #[instrument(skip_all, fields(entity = E::LABEL, id = %id))]
    pub async fn update(&self, id: E::Id, input: E::Input) -> Result<Mutation<E, E>, CrudError> {
        let draft = E::validate(input)?;
        let current = self.get(id).await?;
        let fields = E::resolve(draft, Some(&current), self.client).await?;
        let record = self
            .table
            .update_by_id(id, &fields)
            .await
            .map_err(Self::missing_as_not_found(id))?;
        tracing::info!("Updated {}", E::LABEL);

        Ok(Mutation {
            record,
            listing: self.refresh().await,
        })
    }

    /// Delete a row. Requires a [`Confirmation`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row has that id.
    #[instrument(skip_all, fields(entity = E::LABEL, id = %id))]
    pub async fn remove(
        &self,
        id: E::Id,
        _confirmed: Confirmation,
    ) -> Result<Mutation<E::Id, E>, CrudError> {
        self.table
            .delete_by_id(id)
            .await
            .map_err(Self::missing_as_not_found(id))?;
        tracing::info!("Removed {}", E::LABEL);

        Ok(Mutation {
            record: id,
            listing: self.refresh().await,
        })
    }

    async fn refresh(&self) -> Listing<E> {
        match self.list().await {
            Ok(items) => Listing::Fresh { items },
            Err(e) => {
                tracing::warn!(entity = E::LABEL, error = %e, "List refresh after write failed");
                Listing::Stale {
                    error: format!("Saved, but the {} list could not be reloaded", E::LABEL),
                }
            }
        }
    }
}
