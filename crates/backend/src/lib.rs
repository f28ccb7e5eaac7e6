//! MiniMart backend access.
//!
//! Everything that touches the hosted table store goes through this crate:
//!
//! - [`client`] - The [`DataClient`] capability (select / insert / update /
//!   delete) with a `PostgreSQL` implementation and an in-memory one
//! - [`records`] - Typed rows for each table and the [`Table`] helper that
//!   converts between them and raw JSON rows
//! - [`auth`] - Identity provider: registration, password login, identity
//!   events, and profile sync
//!
//! # Migrations
//!
//! The schema lives in `crates/backend/migrations/` and is applied with:
//! ```bash
//! cargo run -p minimart-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod error;
pub mod records;

pub use auth::{AuthError, AuthService, Identity, IdentityEvent};
pub use client::{
    DataClient, Direction, Filter, MemoryClient, Order, PgClient, Query, Row, create_pool,
};
pub use error::RepositoryError;
pub use records::{
    Buyer, BuyerFields, CartItem, NewCartItem, NewProfile, NewUser, Product, ProductFields,
    Profile, QuantityPatch, Record, Table, Transaction, TransactionFields, UserRow, to_row,
};
