//! Core types for MiniMart.
//!
//! Type-safe wrappers for the domain concepts shared across crates.

pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use category::{Category, CategoryError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
