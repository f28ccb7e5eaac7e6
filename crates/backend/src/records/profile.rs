use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minimart_core::{Email, UserId, UserRole};

use super::Record;

/// Display name and role for an identity. `id` is the user's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl Record for Profile {
    const TABLE: &'static str = "profiles";
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: UserId,
    pub email: Email,
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// Password credential row behind the identity provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Record for UserRow {
    const TABLE: &'static str = "users";
}

#[derive(Clone, Serialize)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
}
