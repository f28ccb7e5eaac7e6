//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use minimart_backend::{Identity, Profile};
use minimart_core::{Email, UserId};

/// Session-stored admin identity.
///
/// Written only after the profile was confirmed to carry the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    /// Profile full name, or the email when none is set.
    pub name: String,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(identity: Identity, profile: &Profile) -> Self {
        let name = profile
            .full_name
            .clone()
            .unwrap_or_else(|| identity.email.to_string());
        Self {
            id: identity.id,
            email: identity.email,
            name,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
