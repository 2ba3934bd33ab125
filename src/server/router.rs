//! HTTP router for toyshelf
//!
//! This module defines the axum router that handles all HTTP requests:
//! health check, toy catalog CRUD, comments, user registration/activation,
//! and authentication tokens.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::auth::{Gate, TokenIssuer};
use crate::database::Store;

use super::handlers;
use super::middleware::{auth_middleware, logging_middleware};

/// Shared application state
pub struct AppState<S: Store> {
    /// Persistence layer
    pub store: Arc<S>,

    /// Authentication/authorization gate
    pub gate: Arc<Gate<S>>,

    /// Token issuer
    pub issuer: Arc<TokenIssuer<S>>,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl<S: Store> AppState<S> {
    /// Wire up the application state around a store
    pub fn new(store: Arc<S>, bcrypt_cost: u32) -> Self {
        Self {
            gate: Arc::new(Gate::new(Arc::clone(&store))),
            issuer: Arc::new(TokenIssuer::new(Arc::clone(&store))),
            store,
            bcrypt_cost,
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            issuer: Arc::clone(&self.issuer),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

/// Build the main application router
///
/// Authentication middleware wraps every route, the fallback included, so a
/// principal is always bound before authorization runs.
pub fn build_router<S: Store + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(handlers::healthcheck::<S>))
        .route("/v1/toy", post(handlers::create_toy::<S>))
        .route(
            "/v1/toy/:id",
            get(handlers::show_toy::<S>)
                .patch(handlers::update_toy::<S>)
                .delete(handlers::delete_toy::<S>),
        )
        .route("/v1/toys", get(handlers::list_toys::<S>))
        .route("/v1/toy/:id/comment", post(handlers::create_comment::<S>))
        .route("/v1/users", post(handlers::register_user::<S>))
        .route("/v1/users/activated", put(handlers::activate_user::<S>))
        .route(
            "/v1/tokens/authentication",
            post(handlers::create_authentication_token::<S>),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.gate),
            auth_middleware::<S>,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
