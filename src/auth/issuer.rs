//! Token issuer
//!
//! Issues opaque bearer tokens, resolves them back to their owning user, and
//! revokes them per scope.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::token::{fingerprint, generate_plaintext};
use crate::database::Store;
use crate::error::StoreError;
use crate::models::{Token, TokenScope, User, PLAINTEXT_LEN};

/// Issues and resolves bearer tokens against the store
pub struct TokenIssuer<S: Store> {
    store: Arc<S>,
}

impl<S: Store> TokenIssuer<S> {
    /// Create a new issuer
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Issue a token for a user
    ///
    /// The returned token is the only place its plaintext ever appears; if
    /// the write fails the plaintext is gone for good, since only the
    /// fingerprint would have been stored.
    pub async fn issue(
        &self,
        user_id: i64,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, StoreError> {
        let plaintext = generate_plaintext();
        let token = Token {
            hash: fingerprint(&plaintext),
            plaintext,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        };

        self.store.insert_token(&token).await?;
        Ok(token)
    }

    /// Resolve a plaintext to the owning user
    ///
    /// Fails with [`StoreError::NotFound`] uniformly for an unknown
    /// plaintext, a wrong scope, or an expired token; the caller cannot tell
    /// which part was wrong. The plaintext length is checked before any
    /// lookup is attempted.
    pub async fn resolve(&self, scope: TokenScope, plaintext: &str) -> Result<User, StoreError> {
        if plaintext.len() != PLAINTEXT_LEN {
            return Err(StoreError::NotFound);
        }

        self.store
            .get_user_for_token(scope, &fingerprint(plaintext))
            .await
    }

    /// Delete all of a user's tokens in a scope
    ///
    /// Used when an activation token is consumed and on re-authentication
    /// flows.
    pub async fn revoke_all(&self, scope: TokenScope, user_id: i64) -> Result<(), StoreError> {
        self.store.delete_tokens_for_user(scope, user_id).await
    }
}
