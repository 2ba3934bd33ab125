//! Authentication and authorization gate
//!
//! Every request passes two stages: authentication binds a [`Principal`] from
//! the `Authorization` header, then authorization checks that principal
//! against the route's requirement. Authentication always runs first; an
//! anonymous principal never passes any authorization check.

use std::sync::Arc;

use super::issuer::TokenIssuer;
use crate::database::Store;
use crate::error::{AuthError, StoreError};
use crate::models::{TokenScope, User, PLAINTEXT_LEN};

/// The identity bound to a request
///
/// An explicit tagged value rather than a shared sentinel: requests without
/// credentials carry `Anonymous`, never a magic user compared by identity.
#[derive(Debug, Clone)]
pub enum Principal {
    /// No valid credentials were presented
    Anonymous,
    /// A resolved, token-authenticated user
    Authenticated(User),
}

impl Principal {
    /// True for the anonymous principal
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    /// The authenticated user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(user) => Some(user),
        }
    }
}

/// Resolves request credentials and enforces route requirements
pub struct Gate<S: Store> {
    store: Arc<S>,
    issuer: TokenIssuer<S>,
}

impl<S: Store> Gate<S> {
    /// Create a new gate
    pub fn new(store: Arc<S>) -> Self {
        Self {
            issuer: TokenIssuer::new(Arc::clone(&store)),
            store,
        }
    }

    /// Stage 1: bind a principal from the `Authorization` header
    ///
    /// A missing header binds [`Principal::Anonymous`]. A present header must
    /// be a well-formed bearer token that resolves in the authentication
    /// scope; anything else fails with [`AuthError::InvalidOrExpiredToken`].
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<Principal, AuthError> {
        let header = match authorization {
            None => return Ok(Principal::Anonymous),
            Some(header) => header,
        };

        let plaintext = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if plaintext.len() != PLAINTEXT_LEN {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        match self
            .issuer
            .resolve(TokenScope::Authentication, plaintext)
            .await
        {
            Ok(user) => Ok(Principal::Authenticated(user)),
            Err(StoreError::NotFound) => Err(AuthError::InvalidOrExpiredToken),
            Err(err) => Err(AuthError::Store(err)),
        }
    }

    /// Stage 2: the route requires an activated account
    pub fn require_activated<'a>(&self, principal: &'a Principal) -> Result<&'a User, AuthError> {
        let user = principal
            .user()
            .ok_or(AuthError::AuthenticationRequired)?;

        if !user.activated {
            return Err(AuthError::NotActivated);
        }

        Ok(user)
    }

    /// Stage 2: the route requires an activated account carrying `code`
    pub async fn require_permission<'a>(
        &self,
        principal: &'a Principal,
        code: &str,
    ) -> Result<&'a User, AuthError> {
        let user = self.require_activated(principal)?;

        let permissions = self.store.permissions_for_user(user.id).await?;
        if !permissions.includes(code) {
            return Err(AuthError::Forbidden);
        }

        Ok(user)
    }
}
