//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;

pub use auth_handler::{handle_obtain_token, handle_refresh_token, handle_verify_token, AppState};
pub use health::health_check;
pub use self::metrics::metrics_handler;
