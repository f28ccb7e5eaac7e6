//! Business logic services for admin.
//!
//! # Services
//!
//! - `crud` - Generic list/create/update/remove over an [`Entity`]
//! - `products`, `buyers`, `transactions` - The three managed entities
//! - `export` - Transactions as CSV
//! - `setup` - Sample catalog and store health report

pub mod buyers;
pub mod crud;
pub mod export;
pub mod products;
pub mod setup;
pub mod transactions;

pub use buyers::{BuyerDetail, BuyerInput, BuyerStats};
pub use crud::{
    Confirmation, Crud, CrudError, Entity, FieldError, Listing, Mutation, ValidationError,
};
pub use products::ProductInput;
pub use setup::{HealthReport, SeedOutcome};
pub use transactions::TransactionInput;
