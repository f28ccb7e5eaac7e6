//! Session-local wishlist.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use minimart_core::ProductId;

use crate::models::session::keys;

/// Product ids the visitor has marked, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    product_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Read the wishlist from the session (empty if none was stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session.get(keys::WISHLIST).await?.unwrap_or_default())
    }

    /// Write the wishlist back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::WISHLIST, self).await
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now listed.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if let Some(pos) = self.product_ids.iter().position(|p| *p == id) {
            self.product_ids.remove(pos);
            false
        } else {
            self.product_ids.push(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.product_ids.contains(&id)
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }
}
