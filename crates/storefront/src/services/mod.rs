//! Business logic services for the storefront.
//!
//! - `catalog` - Product listing, search filter, featured subset
//! - `cart` - Per-user cart kept in sync with `cart_items`
//! - `wishlist` - Session-local wishlist

pub mod cart;
pub mod catalog;
pub mod wishlist;

pub use cart::{Cart, CartError, CartLine, CartLocks, CartSummary, CartSync};
pub use catalog::Catalog;
pub use wishlist::Wishlist;
