//! Common utilities and types shared across token service components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, structural pre-checks)
pub mod jwt;
