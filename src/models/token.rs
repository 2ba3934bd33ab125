//! Bearer token records
//!
//! A token's plaintext is handed to the caller exactly once at issue time;
//! only its SHA-256 fingerprint is persisted and used for lookups.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::validate::Validator;

/// Length of a token plaintext: 16 random bytes, base32 without padding
pub const PLAINTEXT_LEN: usize = 26;

/// Namespace a token is valid for
///
/// A token issued for one scope is never accepted for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// One-shot account activation tokens
    Activation,
    /// Bearer tokens for authenticated API access
    Authentication,
}

impl TokenScope {
    /// Stable string form used in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issued bearer token
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    /// The secret handed to the caller; never persisted
    #[serde(rename = "token")]
    pub plaintext: String,

    /// Hex-encoded SHA-256 of the plaintext; the persisted lookup key
    #[serde(skip_serializing)]
    pub hash: String,

    /// Owning user
    #[serde(skip_serializing)]
    pub user_id: i64,

    /// Instant after which the token is rejected
    pub expiry: DateTime<Utc>,

    /// Namespace the token was issued for
    #[serde(skip_serializing)]
    pub scope: TokenScope,
}

impl Token {
    /// True while the token has not expired
    pub fn is_valid(&self) -> bool {
        self.expiry > Utc::now()
    }
}

/// Shape checks for a client-supplied token plaintext
pub fn validate_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == PLAINTEXT_LEN,
        "token",
        "must be 26 bytes long",
    );
}
