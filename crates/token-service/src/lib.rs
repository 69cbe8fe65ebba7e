//! Token Service Library
//!
//! Exchanges login credentials for signed tokens, refreshes tokens within a
//! window anchored at the original login, and verifies tokens.
//!
//! # Modules
//!
//! - `codec` - Token signing and verification (JWT)
//! - `config` - Service configuration
//! - `directory` - User lookup collaborators
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `models` - Data models
//! - `observability` - Metrics and log correlation
//! - `policy` - Claims shape hooks
//! - `routes` - HTTP router
//! - `services` - Obtain, refresh and verify exchanges

pub mod codec;
pub mod config;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod policy;
pub mod routes;
pub mod services;
