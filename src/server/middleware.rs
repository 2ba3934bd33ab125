//! HTTP middleware for toyshelf
//!
//! This module provides middleware layers for:
//! - Authentication (binding a principal to every request)
//! - Request/response logging

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::Gate;
use crate::database::Store;

use super::handlers::ApiError;

/// Authentication middleware function
///
/// Runs on every request, before any handler:
/// 1. Reads the `Authorization` header, if present
/// 2. Resolves it through the gate; absence binds the anonymous principal
/// 3. Inserts the bound [`Principal`](crate::auth::Principal) into the
///    request extensions for handlers to authorize against
///
/// A present-but-invalid header fails the request here with a 401.
pub async fn auth_middleware<S: Store + 'static>(
    State(gate): State<Arc<Gate<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = gate
        .authenticate(authorization)
        .await
        .map_err(ApiError::from_auth)?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Logging middleware function
///
/// Logs request and response details including:
/// - Method and path
/// - Status code
/// - Response time
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        status = %status.as_u16(),
        duration_ms = %elapsed.as_millis(),
        "Request completed"
    );

    response
}
