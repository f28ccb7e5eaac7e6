//! MiniMart Core - Shared domain types.
//!
//! Types used by every MiniMart component:
//! - `backend` - Remote data client, records, identity provider
//! - `storefront` - Customer-facing catalog and cart
//! - `admin` - Back-office CRUD for products, buyers, and transactions
//! - `cli` - Migrations, seeding, and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Anything that talks to the table store lives in `minimart-backend`.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, price, category, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
