//! Generic CRUD handlers, instantiated once per entity.
//!
//! ```text
//! GET    /              - List, newest first
//! POST   /              - Create
//! GET    /{id}          - Show
//! PUT    /{id}          - Update
//! DELETE /{id}?confirm=true - Remove
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::{Confirmation, Crud, Entity, Mutation};
use crate::state::AppState;

/// Query string for deletes.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// `GET /api/<entity>`
#[instrument(skip_all, fields(entity = E::LABEL))]
pub async fn index<E: Entity>(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<E>>> {
    Ok(Json(Crud::<E>::new(state.client()).list().await?))
}

/// `GET /api/<entity>/{id}`
#[instrument(skip_all, fields(entity = E::LABEL, id = %id))]
pub async fn show<E>(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
) -> Result<Json<E>>
where
    E: Entity,
{
    Ok(Json(Crud::<E>::new(state.client()).get(id).await?))
}

/// `POST /api/<entity>`
#[instrument(skip_all, fields(entity = E::LABEL, admin = %admin.email))]
pub async fn create<E>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<E::Input>,
) -> Result<(StatusCode, Json<Mutation<E, E>>)>
where
    E: Entity,
{
    let mutation = Crud::<E>::new(state.client()).create(input).await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

/// `PUT /api/<entity>/{id}`
#[instrument(skip_all, fields(entity = E::LABEL, admin = %admin.email, id = %id))]
pub async fn update<E>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
    Json(input): Json<E::Input>,
) -> Result<Json<Mutation<E, E>>>
where
    E: Entity,
{
    Ok(Json(
        Crud::<E>::new(state.client()).update(id, input).await?,
    ))
}

/// `DELETE /api/<entity>/{id}?confirm=true`
#[instrument(skip_all, fields(entity = E::LABEL, admin = %admin.email, id = %id))]
pub async fn remove<E>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Mutation<E::Id, E>>>
where
    E: Entity,
{
    let confirmed = Confirmation::from_flag(query.confirm).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Deleting a {} must be confirmed with ?confirm=true",
            E::LABEL
        ))
    })?;
    Ok(Json(
        Crud::<E>::new(state.client()).remove(id, confirmed).await?,
    ))
}

/// Full CRUD router for `E`.
pub fn router<E>() -> Router<AppState>
where
    E: Entity,
    E::Id: DeserializeOwned,
    E::Input: DeserializeOwned,
{
    Router::new()
        .route("/", get(index::<E>).post(create::<E>))
        .route(
            "/{id}",
            get(show::<E>).put(update::<E>).delete(remove::<E>),
        )
}
