//! User accounts and password credentials

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PasswordError;
use crate::validate::{self, Validator};

/// A registered account
///
/// `version` starts at 1 on insert and is bumped by exactly 1 on every
/// successful update; it is the compare-and-swap key for the store's
/// conditional writes and never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// Display name
    pub name: String,

    /// Account role (e.g. `member`, `admin`)
    pub role: String,

    /// Email address, unique across accounts
    pub email: String,

    /// Password credential; never serialized
    #[serde(skip_serializing)]
    pub password: Password,

    /// Whether the account has been activated
    pub activated: bool,

    /// Optimistic-concurrency counter; never serialized
    #[serde(skip_serializing)]
    pub version: i64,
}

impl User {
    /// Run the account-level validation checks
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(
            self.name.len() <= 500,
            "name",
            "must not be more than 500 bytes long",
        );

        validate_email(v, &self.email);

        if let Some(plaintext) = self.password.plaintext() {
            validate_password_plaintext(v, plaintext);
        }
    }
}

/// Email validation checks shared by registration and sign-in
pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        validate::EMAIL_PATTERN.is_match(email),
        "email",
        "must be a valid email address",
    );
}

/// Plaintext password policy, enforced before hashing
pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= 8,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= 72,
        "password",
        "must not be more than 72 bytes long",
    );
}

/// A bcrypt password credential
///
/// The plaintext is retained only on the instance built from user input, so
/// the policy checks above can read it for the rest of the request; it is
/// never persisted, serialized, or printed. Instances loaded from the store
/// carry the hash alone.
#[derive(Clone)]
pub struct Password {
    plaintext: Option<String>,
    hash: String,
}

impl Password {
    /// Hash a plaintext password with the given bcrypt cost
    ///
    /// # Errors
    ///
    /// Fails only if the hashing primitive itself fails, never for policy
    /// reasons; length and strength are validated upstream.
    pub fn from_plaintext(plaintext: &str, cost: u32) -> Result<Self, PasswordError> {
        let hash = bcrypt::hash(plaintext, cost)?;
        Ok(Self {
            plaintext: Some(plaintext.to_string()),
            hash,
        })
    }

    /// Rehydrate a credential from a stored hash
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            plaintext: None,
            hash: hash.into(),
        }
    }

    /// Compare a candidate plaintext against the stored hash
    ///
    /// Returns `Ok(false)` on a simple mismatch. An `Err` is reserved for
    /// unexpected verification failures such as a corrupt stored hash.
    pub fn matches(&self, candidate: &str) -> Result<bool, PasswordError> {
        Ok(bcrypt::verify(candidate, &self.hash)?)
    }

    /// The stored bcrypt hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The transient plaintext, present only on credentials built from input
    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_deref()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(redacted)")
    }
}

/// The set of permission codes granted to a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(Vec<String>);

impl Permissions {
    /// Wrap a list of permission codes
    pub fn new(codes: Vec<String>) -> Self {
        Self(codes)
    }

    /// True when the set contains `code`
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }

    /// Number of codes in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no codes are granted
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Permissions {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}
