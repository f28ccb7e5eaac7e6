//! Application state for admin.

use std::sync::Arc;

use minimart_backend::{AuthService, DataClient};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    client: Arc<dyn DataClient>,
    auth: AuthService,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, client: Arc<dyn DataClient>) -> Self {
        let auth = AuthService::new(Arc::clone(&client));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                auth,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn client(&self) -> &dyn DataClient {
        self.inner.client.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
