//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use toyshelf::database::{SqliteStore, Store};
use toyshelf::models::{Password, Toy, User};
use toyshelf::server::{build_router, AppState};

/// Low bcrypt cost keeps the test suite fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Create an in-memory store for testing
pub async fn create_test_store() -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Build a user record ready for insertion
pub fn new_user(name: &str, email: &str, password: &str) -> User {
    User {
        id: 0,
        created_at: Utc::now(),
        name: name.to_string(),
        role: "member".to_string(),
        email: email.to_string(),
        password: Password::from_plaintext(password, TEST_BCRYPT_COST)
            .expect("Failed to hash test password"),
        activated: false,
        version: 0,
    }
}

/// Insert an already-activated user
pub async fn insert_activated_user(store: &SqliteStore, email: &str) -> User {
    let mut user = store
        .insert_user(&new_user("Aruzhan", email, "test-password"))
        .await
        .expect("Failed to insert test user");

    user.activated = true;
    store
        .update_user(&user)
        .await
        .expect("Failed to activate test user")
}

/// Build a toy record ready for insertion
pub fn new_toy(title: &str, value: i64) -> Toy {
    Toy {
        id: 0,
        created_at: Utc::now(),
        title: title.to_string(),
        description: "A toy".to_string(),
        details: Vec::new(),
        skills: vec!["motor".to_string()],
        categories: vec!["construction".to_string()],
        images: vec!["https://cdn.example.com/toy.jpg".to_string()],
        recommended_age: "3-5".to_string(),
        manufacturer: "OyuncaqCo".to_string(),
        value,
        is_available: true,
        wait_list: Vec::new(),
        version: 0,
    }
}

/// Spawn the API server over the given store on a random port
///
/// Returns the base URL of the running server.
pub async fn spawn_test_server(store: Arc<SqliteStore>) -> String {
    let state = AppState::new(store, TEST_BCRYPT_COST);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server crashed");
    });

    format!("http://{}", addr)
}
