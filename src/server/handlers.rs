//! Request handlers for the toyshelf API
//!
//! Handlers authorize against the request's bound [`Principal`], run the
//! field validations, and translate domain errors into JSON error envelopes.

use std::collections::HashMap;

use axum::extract::{Extension, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, Principal};
use crate::database::Store;
use crate::error::{AuthError, StoreError};
use crate::models::{token, Comment, Password, Rating, Token, TokenScope, Toy, ToyFilter, User};
use crate::validate::Validator;

use super::router::AppState;

/// JSON error envelope with a status code
///
/// Validation failures carry per-field messages under `errors`; everything
/// else carries a single message under `error`. Store and hashing failures
/// are logged here and surfaced as opaque 500s.
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    /// 422 with per-field validation messages
    pub fn validation(errors: HashMap<String, String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: json!({ "errors": errors }),
        }
    }

    /// 404 for missing resources
    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "the requested resource could not be found",
        )
    }

    /// 409 when a version-matched write lost to a concurrent writer
    pub fn edit_conflict() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "unable to update the record due to an edit conflict, please try again",
        )
    }

    /// 401 for failed sign-in attempts
    pub fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "invalid authentication credentials",
        )
    }

    /// Opaque 500; the cause must already have been logged
    pub fn server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "the server encountered a problem and could not process your request",
        )
    }

    /// Map an authorization failure onto a response
    pub fn from_auth(err: AuthError) -> Self {
        match err {
            AuthError::InvalidOrExpiredToken => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid or expired authentication token")
            }
            AuthError::AuthenticationRequired => Self::new(
                StatusCode::UNAUTHORIZED,
                "you must be authenticated to access this resource",
            ),
            AuthError::NotActivated => Self::new(
                StatusCode::FORBIDDEN,
                "your user account must be activated to access this resource",
            ),
            AuthError::Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                "your user account doesn't have the necessary permissions to access this resource",
            ),
            AuthError::Store(err) => Self::from_store(err),
        }
    }

    /// Map a store failure onto a response
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found(),
            StoreError::EditConflict => Self::edit_conflict(),
            StoreError::DuplicateEmail => {
                let mut errors = HashMap::new();
                errors.insert(
                    "email".to_string(),
                    "a user with this email address already exists".to_string(),
                );
                Self::validation(errors)
            }
            err => {
                tracing::error!(error = %err, "Store operation failed");
                Self::server_error()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

/// `GET /v1/healthcheck`
pub async fn healthcheck<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_activated(&principal)
        .map_err(ApiError::from_auth)?;

    Ok(Json(json!({
        "status": "available",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

// =============================================================================
// Users and tokens
// =============================================================================

/// `POST /v1/users` request body
#[derive(Debug, Deserialize)]
pub struct RegisterUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /v1/users`
///
/// Registers a non-activated account, grants the base permissions, and
/// issues the activation token the caller needs for `PUT /v1/users/activated`.
pub async fn register_user<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(input): Json<RegisterUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let password =
        Password::from_plaintext(&input.password, state.bcrypt_cost).map_err(|err| {
            tracing::error!(error = %err, "Password hashing failed");
            ApiError::server_error()
        })?;

    let user = User {
        id: 0,
        created_at: Utc::now(),
        name: input.name,
        role: "member".to_string(),
        email: input.email,
        password,
        activated: false,
        version: 0,
    };

    let mut v = Validator::new();
    user.validate(&mut v);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let user = state
        .store
        .insert_user(&user)
        .await
        .map_err(ApiError::from_store)?;

    for code in ["toys:read", "toys:comment"] {
        state
            .store
            .grant_permission(user.id, code)
            .await
            .map_err(ApiError::from_store)?;
    }

    let activation_token = issue_token(&state, user.id, TokenScope::Activation).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "activation_token": activation_token })),
    ))
}

/// `PUT /v1/users/activated` request body
#[derive(Debug, Deserialize)]
pub struct ActivateUserInput {
    pub token: String,
}

/// `PUT /v1/users/activated`
///
/// Consumes an activation-scope token: flips the activation flag through the
/// version-matched update path and revokes the user's remaining activation
/// tokens.
pub async fn activate_user<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(input): Json<ActivateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();
    token::validate_plaintext(&mut v, &input.token);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let mut user = match state
        .issuer
        .resolve(TokenScope::Activation, &input.token)
        .await
    {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            let mut v = Validator::new();
            v.add_error("token", "invalid or expired activation token");
            return Err(ApiError::validation(v.into_errors()));
        }
        Err(err) => return Err(ApiError::from_store(err)),
    };

    user.activated = true;

    let user = state
        .store
        .update_user(&user)
        .await
        .map_err(ApiError::from_store)?;

    state
        .issuer
        .revoke_all(TokenScope::Activation, user.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(json!({ "user": user })))
}

/// `POST /v1/tokens/authentication` request body
#[derive(Debug, Deserialize)]
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

/// `POST /v1/tokens/authentication`
///
/// Exchanges email and password for a 24-hour bearer token. An unknown email
/// and a wrong password produce the same response.
pub async fn create_authentication_token<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Json(input): Json<CredentialsInput>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();
    crate::models::user::validate_email(&mut v, &input.email);
    crate::models::user::validate_password_plaintext(&mut v, &input.password);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let user = match state.store.get_user_by_email(&input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::invalid_credentials()),
        Err(err) => return Err(ApiError::from_store(err)),
    };

    let matches = user.password.matches(&input.password).map_err(|err| {
        tracing::error!(error = %err, "Password verification failed");
        ApiError::server_error()
    })?;
    if !matches {
        return Err(ApiError::invalid_credentials());
    }

    let authentication_token = issue_token(&state, user.id, TokenScope::Authentication).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": authentication_token })),
    ))
}

async fn issue_token<S: Store + 'static>(
    state: &AppState<S>,
    user_id: i64,
    scope: TokenScope,
) -> Result<Token, ApiError> {
    let ttl = match scope {
        TokenScope::Activation => auth::activation_ttl(),
        TokenScope::Authentication => auth::authentication_ttl(),
    };

    state
        .issuer
        .issue(user_id, ttl, scope)
        .await
        .map_err(ApiError::from_store)
}

// =============================================================================
// Toys
// =============================================================================

/// `POST /v1/toy` request body
#[derive(Debug, Deserialize)]
pub struct CreateToyInput {
    pub title: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
    pub skills: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub categories: Vec<String>,
    #[serde(rename = "recAge")]
    pub recommended_age: String,
    pub manufacturer: String,
    pub value: i64,
    #[serde(rename = "isAvailable", default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// `POST /v1/toy`
pub async fn create_toy<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<CreateToyInput>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_permission(&principal, "toys:write")
        .await
        .map_err(ApiError::from_auth)?;

    let toy = Toy {
        id: 0,
        created_at: Utc::now(),
        title: input.title,
        description: input.description,
        details: input.details,
        skills: input.skills,
        images: input.images,
        categories: input.categories,
        recommended_age: input.recommended_age,
        manufacturer: input.manufacturer,
        value: input.value,
        is_available: input.is_available,
        wait_list: Vec::new(),
        version: 0,
    };

    let mut v = Validator::new();
    toy.validate(&mut v);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let toy = state
        .store
        .insert_toy(&toy)
        .await
        .map_err(ApiError::from_store)?;

    let location = format!("/v1/toy/{}", toy.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "toy": toy })),
    ))
}

/// `GET /v1/toy/:id`
pub async fn show_toy<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_permission(&principal, "toys:read")
        .await
        .map_err(ApiError::from_auth)?;

    let toy = state
        .store
        .get_toy(id)
        .await
        .map_err(ApiError::from_store)?;

    let comments = state
        .store
        .comments_for_toy(toy.id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(json!({ "toy": toy, "comments": comments })))
}

/// `PATCH /v1/toy/:id` request body; absent fields keep their stored value
#[derive(Debug, Deserialize)]
pub struct UpdateToyInput {
    pub title: Option<String>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub details: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    #[serde(rename = "recAge")]
    pub recommended_age: Option<String>,
    pub manufacturer: Option<String>,
    pub value: Option<i64>,
    #[serde(rename = "isAvailable")]
    pub is_available: Option<bool>,
}

/// `PATCH /v1/toy/:id`
///
/// Read-modify-write against the version the read returned; a concurrent
/// writer winning in between surfaces as a 409 for the client to retry.
pub async fn update_toy<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateToyInput>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_permission(&principal, "toys:write")
        .await
        .map_err(ApiError::from_auth)?;

    let mut toy = state
        .store
        .get_toy(id)
        .await
        .map_err(ApiError::from_store)?;

    if let Some(title) = input.title {
        toy.title = title;
    }
    if let Some(description) = input.description {
        toy.description = description;
    }
    if let Some(details) = input.details {
        toy.details = details;
    }
    if let Some(skills) = input.skills {
        toy.skills = skills;
    }
    if let Some(categories) = input.categories {
        toy.categories = categories;
    }
    if let Some(images) = input.images {
        toy.images = images;
    }
    if let Some(recommended_age) = input.recommended_age {
        toy.recommended_age = recommended_age;
    }
    if let Some(manufacturer) = input.manufacturer {
        toy.manufacturer = manufacturer;
    }
    if let Some(value) = input.value {
        toy.value = value;
    }
    if let Some(is_available) = input.is_available {
        toy.is_available = is_available;
    }

    let mut v = Validator::new();
    toy.validate(&mut v);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let toy = state
        .store
        .update_toy(&toy)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(json!({ "toy": toy })))
}

/// `DELETE /v1/toy/:id`
pub async fn delete_toy<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_permission(&principal, "toys:write")
        .await
        .map_err(ApiError::from_auth)?;

    state
        .store
        .delete_toy(id)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(json!({ "message": "toy successfully deleted" })))
}

/// `GET /v1/toys` query parameters
#[derive(Debug, Deserialize)]
pub struct ListToysQuery {
    pub title: Option<String>,
    pub categories: Option<String>,
    pub skills: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort: Option<String>,
}

/// `GET /v1/toys`
pub async fn list_toys<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListToysQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .gate
        .require_permission(&principal, "toys:read")
        .await
        .map_err(ApiError::from_auth)?;

    let mut filter = ToyFilter::default();
    if let Some(title) = query.title {
        filter.title = title;
    }
    if let Some(categories) = query.categories {
        filter.categories = split_csv(&categories);
    }
    if let Some(skills) = query.skills {
        filter.skills = split_csv(&skills);
    }
    if let Some(from) = query.from {
        filter.value_from = from;
    }
    if let Some(to) = query.to {
        filter.value_to = to;
    }
    if let Some(page) = query.page {
        filter.page = page;
    }
    if let Some(page_size) = query.page_size {
        filter.page_size = page_size;
    }
    if let Some(sort) = query.sort {
        filter.sort = sort;
    }

    let mut v = Validator::new();
    filter.validate(&mut v);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let (toys, metadata) = state
        .store
        .list_toys(&filter)
        .await
        .map_err(ApiError::from_store)?;

    Ok(Json(json!({ "toys": toys, "metadata": metadata })))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Comments
// =============================================================================

/// `POST /v1/toy/:id/comment` request body
#[derive(Debug, Deserialize)]
pub struct CreateCommentInput {
    pub text: String,
    pub rating: Rating,
}

/// `POST /v1/toy/:id/comment`
pub async fn create_comment<S: Store + 'static>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(input): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .gate
        .require_permission(&principal, "toys:comment")
        .await
        .map_err(ApiError::from_auth)?;

    // The toy must exist before the comment is attached to it
    let toy = state
        .store
        .get_toy(id)
        .await
        .map_err(ApiError::from_store)?;

    let comment = Comment {
        id: 0,
        created_at: Utc::now(),
        toy_id: toy.id,
        user_name: user.name.clone(),
        text: input.text,
        rating: input.rating,
    };

    let mut v = Validator::new();
    comment.validate(&mut v);
    if !v.is_valid() {
        return Err(ApiError::validation(v.into_errors()));
    }

    let comment = state
        .store
        .insert_comment(&comment)
        .await
        .map_err(ApiError::from_store)?;

    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

// =============================================================================
// Fallback
// =============================================================================

/// Fallback handler for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
