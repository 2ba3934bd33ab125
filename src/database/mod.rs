//! Persistence layer for toyshelf
//!
//! This module defines the store trait and its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Comment, PageMetadata, Permissions, Token, TokenScope, Toy, ToyFilter, User};

/// Store trait for data persistence
///
/// Defines every persistence operation the application needs. Mutable
/// records (users, toys) go through version-matched conditional writes;
/// a write that matches zero rows because a concurrent writer bumped the
/// version fails with [`StoreError::EditConflict`]. Callers re-fetch and
/// retry or surface the conflict; the store never retries on its own.
///
/// It uses `async_trait` for async methods and `mockall::automock` for
/// testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Insert a new user; the returned record carries the assigned ID and
    /// version 1
    ///
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<User, StoreError>;

    /// Fetch a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Version-matched user update; returns the record with the bumped version
    ///
    /// Fails with [`StoreError::EditConflict`] when a concurrent writer won,
    /// or [`StoreError::DuplicateEmail`] when the new email is taken.
    async fn update_user(&self, user: &User) -> Result<User, StoreError>;

    /// Fetch the user owning an unexpired token with the given hash and scope
    ///
    /// Any miss (unknown hash, wrong scope, expired) is uniformly
    /// [`StoreError::NotFound`].
    async fn get_user_for_token(
        &self,
        scope: TokenScope,
        token_hash: &str,
    ) -> Result<User, StoreError>;

    // =========================================================================
    // Permission operations
    // =========================================================================

    /// Fetch the permission codes granted to a user
    async fn permissions_for_user(&self, user_id: i64) -> Result<Permissions, StoreError>;

    /// Grant a permission code to a user (no-op when already granted)
    async fn grant_permission(&self, user_id: i64, code: &str) -> Result<(), StoreError>;

    // =========================================================================
    // Token operations
    // =========================================================================

    /// Persist an issued token (hash, owner, expiry, scope)
    async fn insert_token(&self, token: &Token) -> Result<(), StoreError>;

    /// Delete all of a user's tokens in a scope
    async fn delete_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<(), StoreError>;

    // =========================================================================
    // Toy operations
    // =========================================================================

    /// Insert a new toy; the returned record carries the assigned ID and
    /// version 1
    async fn insert_toy(&self, toy: &Toy) -> Result<Toy, StoreError>;

    /// Fetch a toy by ID; non-positive IDs fail without a store round-trip
    async fn get_toy(&self, id: i64) -> Result<Toy, StoreError>;

    /// Version-matched toy update; returns the record with the bumped version
    async fn update_toy(&self, toy: &Toy) -> Result<Toy, StoreError>;

    /// Delete a toy by ID
    async fn delete_toy(&self, id: i64) -> Result<(), StoreError>;

    /// List toys matching the filter, with pagination metadata
    async fn list_toys(&self, filter: &ToyFilter)
        -> Result<(Vec<Toy>, PageMetadata), StoreError>;

    // =========================================================================
    // Comment operations
    // =========================================================================

    /// Insert a comment; the returned record carries the assigned ID
    async fn insert_comment(&self, comment: &Comment) -> Result<Comment, StoreError>;

    /// Fetch all comments for a toy
    async fn comments_for_toy(&self, toy_id: i64) -> Result<Vec<Comment>, StoreError>;
}
