//! toyshelf - a JSON REST backend for a toy-catalog marketplace
//!
//! This crate provides the API server behind the marketplace: toy listings
//! with comments and ratings, user accounts, bearer-token authentication
//! with scoped tokens, and permission-gated catalog operations, backed by
//! SQLite with optimistic-concurrency updates.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod server;
pub mod validate;
