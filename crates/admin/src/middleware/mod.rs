//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer`
//! 3. Request ID
//! 4. Session layer (signed cookie, `admin.session`)
//! 5. Rate limiting on `/api/auth/login`

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    AdminAuthRejection, OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, postgres_store};
