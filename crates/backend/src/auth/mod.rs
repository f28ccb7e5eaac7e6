//! Identity provider.
//!
//! Email/password accounts stored in `users`, hashed with Argon2id. Every
//! successful sign-up, sign-in, and sign-out is published on a broadcast
//! channel; [`AuthService::spawn_profile_sync`] listens to it and makes sure
//! each signed-in identity has a `profiles` row.
//!
//! The "current identity" of a request is kept in the HTTP session by the
//! binaries; this module only verifies credentials.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::instrument;

use minimart_core::{Email, UserId, UserRole};

use crate::client::{DataClient, Query};
use crate::error::RepositoryError;
use crate::records::{NewProfile, NewUser, Profile, Table, UserRow};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Identity-change events buffered per subscriber before lagging.
const EVENT_CAPACITY: usize = 64;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
}

/// Identity-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedUp(Identity),
    SignedIn(Identity),
    SignedOut(UserId),
}

/// Authentication service.
///
/// Cheap to clone; clones share the event channel.
#[derive(Clone)]
pub struct AuthService {
    client: Arc<dyn DataClient>,
    events: broadcast::Sender<IdentityEvent>,
}

impl AuthService {
    #[must_use]
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, events }
    }

    fn users(&self) -> Table<'_, UserRow> {
        Table::new(self.client.as_ref())
    }

    fn profiles(&self) -> Table<'_, Profile> {
        Table::new(self.client.as_ref())
    }

    /// Subscribe to identity-change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: IdentityEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users()
            .insert(&NewUser {
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let identity = Identity {
            id: user.id,
            email: user.email,
        };
        tracing::info!(user_id = %identity.id, "User registered");
        self.publish(IdentityEvent::SignedUp(identity.clone()));
        Ok(identity)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users()
            .find(Query::new().eq("email", email.as_str()))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let identity = Identity {
            id: user.id,
            email: user.email,
        };
        self.publish(IdentityEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Record a sign-out. Clearing the session is the caller's job.
    pub fn logout(&self, identity: &Identity) {
        self.publish(IdentityEvent::SignedOut(identity.id));
    }

    /// Look up an identity by user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn identity(&self, id: UserId) -> Result<Identity, AuthError> {
        let user = self.users().get(id).await?.ok_or(AuthError::UserNotFound)?;
        Ok(Identity {
            id: user.id,
            email: user.email,
        })
    }

    /// Fetch the profile for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn profile(&self, id: UserId) -> Result<Option<Profile>, AuthError> {
        Ok(self.profiles().get(id).await?)
    }

    /// Make sure `identity` has a profile, creating a buyer profile if missing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup or insert fails.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, AuthError> {
        ensure_profile(self.client.as_ref(), identity).await
    }

    /// Create a user with a given role and display name (used for bootstrapping admins).
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`], plus repository errors while writing the profile.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        role: UserRole,
    ) -> Result<Profile, AuthError> {
        let identity = self.register(email, password).await?;
        self.ensure_profile(&identity).await?;

        let patch = serde_json::json!({
            "full_name": full_name.map_or_else(|| identity.email.to_string(), str::to_owned),
            "role": role,
        });
        Ok(self.profiles().update_by_id(identity.id, &patch).await?)
    }

    /// Spawn a task that creates profiles for identities as they sign in.
    ///
    /// The task ends when every `AuthService` clone has been dropped.
    #[must_use]
    pub fn spawn_profile_sync(&self) -> JoinHandle<()> {
        let mut events = self.subscribe();
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(IdentityEvent::SignedIn(identity) | IdentityEvent::SignedUp(identity)) => {
                        if let Err(e) = ensure_profile(client.as_ref(), &identity).await {
                            tracing::error!(user_id = %identity.id, error = %e, "Profile sync failed");
                        }
                    }
                    Ok(IdentityEvent::SignedOut(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Profile sync lagged behind identity events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Profile sync stopped");
        })
    }
}

#[instrument(skip(client), fields(user_id = %identity.id))]
async fn ensure_profile(client: &dyn DataClient, identity: &Identity) -> Result<Profile, AuthError> {
    let profiles = Table::<Profile>::new(client);
    if let Some(profile) = profiles.get(identity.id).await? {
        return Ok(profile);
    }

    let new = NewProfile {
        id: identity.id,
        email: identity.email.clone(),
        full_name: Some(identity.email.to_string()),
        role: UserRole::Buyer,
    };
    match profiles.insert(&new).await {
        Ok(profile) => {
            tracing::info!("Profile created");
            Ok(profile)
        }
        // Another task created it first.
        Err(RepositoryError::Conflict(_)) => profiles
            .get(identity.id)
            .await?
            .ok_or(AuthError::UserNotFound),
        Err(e) => Err(e.into()),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
