//! Authentication flow integration tests
//!
//! Tests the token issuer and gate against a real in-memory store:
//! - Issue/resolve round trips per scope
//! - The uniform not-found property across miss causes
//! - Revocation and header authentication

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::*;
use toyshelf::auth::{Gate, TokenIssuer};
use toyshelf::database::Store;
use toyshelf::error::{AuthError, StoreError};
use toyshelf::models::{TokenScope, PLAINTEXT_LEN};

/// Test 1: Issue then resolve returns the owning user
#[tokio::test]
async fn test_issue_then_resolve() {
    let store = create_test_store().await;
    let user = insert_activated_user(&store, "aruzhan@example.com").await;
    let issuer = TokenIssuer::new(Arc::clone(&store));

    let token = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    assert_eq!(token.plaintext.len(), PLAINTEXT_LEN);

    let resolved = issuer
        .resolve(TokenScope::Authentication, &token.plaintext)
        .await
        .unwrap();
    assert_eq!(resolved.id, user.id);
    assert_eq!(resolved.email, "aruzhan@example.com");
}

/// Test 2: Misses are uniform across causes
///
/// Unknown plaintext, wrong scope and expiry all fail with the same
/// RecordNotFound; the caller cannot tell which part was wrong.
#[tokio::test]
async fn test_resolve_uniform_misses() {
    let store = create_test_store().await;
    let user = insert_activated_user(&store, "aruzhan@example.com").await;
    let issuer = TokenIssuer::new(Arc::clone(&store));

    let token = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();

    // Unknown plaintext (well-formed but never issued)
    let result = issuer
        .resolve(TokenScope::Authentication, &"A".repeat(PLAINTEXT_LEN))
        .await;
    assert!(matches!(result, Err(StoreError::NotFound)));

    // Correct plaintext, wrong scope
    let result = issuer
        .resolve(TokenScope::Activation, &token.plaintext)
        .await;
    assert!(matches!(result, Err(StoreError::NotFound)));

    // Correct plaintext and scope, already expired
    let expired = issuer
        .issue(user.id, Duration::hours(-1), TokenScope::Authentication)
        .await
        .unwrap();
    let result = issuer
        .resolve(TokenScope::Authentication, &expired.plaintext)
        .await;
    assert!(matches!(result, Err(StoreError::NotFound)));
}

/// Test 3: Revocation kills every token in the scope, nothing else
#[tokio::test]
async fn test_revoke_all_is_scoped() {
    let store = create_test_store().await;
    let user = insert_activated_user(&store, "aruzhan@example.com").await;
    let issuer = TokenIssuer::new(Arc::clone(&store));

    let auth1 = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    let auth2 = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    let activation = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Activation)
        .await
        .unwrap();

    issuer
        .revoke_all(TokenScope::Authentication, user.id)
        .await
        .unwrap();

    for plaintext in [&auth1.plaintext, &auth2.plaintext] {
        let result = issuer.resolve(TokenScope::Authentication, plaintext).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    // The activation token is untouched
    assert!(issuer
        .resolve(TokenScope::Activation, &activation.plaintext)
        .await
        .is_ok());
}

/// Test 4: The gate binds principals from headers
#[tokio::test]
async fn test_gate_authenticate_header() {
    let store = create_test_store().await;
    let user = insert_activated_user(&store, "aruzhan@example.com").await;
    let issuer = TokenIssuer::new(Arc::clone(&store));
    let gate = Gate::new(Arc::clone(&store));

    // No header binds the anonymous principal
    let principal = gate.authenticate(None).await.unwrap();
    assert!(principal.is_anonymous());

    // A live token binds the user
    let token = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    let header = format!("Bearer {}", token.plaintext);
    let principal = gate.authenticate(Some(&header)).await.unwrap();
    assert_eq!(principal.user().unwrap().id, user.id);

    // An activation token is not an authentication credential
    let activation = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Activation)
        .await
        .unwrap();
    let header = format!("Bearer {}", activation.plaintext);
    let result = gate.authenticate(Some(&header)).await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

/// Test 5: Permission enforcement end to end
#[tokio::test]
async fn test_gate_permissions() {
    let store = create_test_store().await;
    let user = insert_activated_user(&store, "aruzhan@example.com").await;
    store.grant_permission(user.id, "toys:read").await.unwrap();

    let issuer = TokenIssuer::new(Arc::clone(&store));
    let gate = Gate::new(Arc::clone(&store));

    let token = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    let header = format!("Bearer {}", token.plaintext);
    let principal = gate.authenticate(Some(&header)).await.unwrap();

    assert!(gate.require_permission(&principal, "toys:read").await.is_ok());

    let result = gate.require_permission(&principal, "toys:write").await;
    assert!(matches!(result, Err(AuthError::Forbidden)));
}

/// Test 6: A non-activated account stops at the activation check
#[tokio::test]
async fn test_gate_requires_activation() {
    let store = create_test_store().await;
    let user = store
        .insert_user(&new_user("Aruzhan", "aruzhan@example.com", "test-password"))
        .await
        .unwrap();
    store.grant_permission(user.id, "toys:read").await.unwrap();

    let issuer = TokenIssuer::new(Arc::clone(&store));
    let gate = Gate::new(Arc::clone(&store));

    let token = issuer
        .issue(user.id, Duration::hours(1), TokenScope::Authentication)
        .await
        .unwrap();
    let header = format!("Bearer {}", token.plaintext);
    let principal = gate.authenticate(Some(&header)).await.unwrap();

    let result = gate.require_permission(&principal, "toys:read").await;
    assert!(matches!(result, Err(AuthError::NotActivated)));
}
