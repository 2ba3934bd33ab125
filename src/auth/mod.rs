//! Authentication for toyshelf
//!
//! This module provides token generation, the token issuer, and the
//! authentication/authorization gate.

pub mod gate;
pub mod issuer;
pub mod token;

pub use gate::{Gate, Principal};
pub use issuer::TokenIssuer;
pub use token::{fingerprint, generate_plaintext};

use chrono::Duration;

/// Lifetime of account-activation tokens
pub fn activation_ttl() -> Duration {
    Duration::days(3)
}

/// Lifetime of authentication tokens
pub fn authentication_ttl() -> Duration {
    Duration::hours(24)
}
