//! Session-related types.

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in identity.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the visitor's wishlist.
    pub const WISHLIST: &str = "wishlist";
}
