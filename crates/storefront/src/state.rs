//! Application state shared across handlers.

use std::sync::Arc;

use minimart_backend::{AuthService, DataClient};

use crate::config::StorefrontConfig;
use crate::services::CartLocks;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: Arc<dyn DataClient>,
    auth: AuthService,
    cart_locks: CartLocks,
}

impl AppState {
    /// Create a new application state over a data client.
    #[must_use]
    pub fn new(config: StorefrontConfig, client: Arc<dyn DataClient>) -> Self {
        let auth = AuthService::new(Arc::clone(&client));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                auth,
                cart_locks: CartLocks::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Shared data client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn DataClient> {
        &self.inner.client
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}
