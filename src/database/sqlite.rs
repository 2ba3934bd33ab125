//! SQLite implementation of the Store trait
//!
//! This module provides a SQLite-based implementation of the Store trait
//! using rusqlite and tokio-rusqlite for async operations. Every call is
//! bounded by a fixed deadline; an expired deadline surfaces as
//! [`StoreError::Timeout`] and is never retried here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::Store;
use crate::error::StoreError;
use crate::models::{
    Comment, PageMetadata, Password, Permissions, Rating, Token, TokenScope, Toy, ToyFilter, User,
};

/// Deadline applied to every store operation
const STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// SQLite store implementation
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a SQLite store and apply the schema
    ///
    /// Use `:memory:` for an in-memory database or a file path for
    /// persistent storage.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;

        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Create a new in-memory store (useful for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:").await
    }

    /// Run a closure on the connection actor, bounded by the store deadline
    async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(STORE_TIMEOUT, self.conn.call(f)).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let created_at = Utc::now();
        let name = user.name.clone();
        let role = user.role.clone();
        let email = user.email.clone();
        let password_hash = user.password.hash().to_string();
        let activated = user.activated;

        let id = self
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO users (created_at, name, role, email, password_hash, activated)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    rusqlite::params![
                        created_at.to_rfc3339(),
                        name,
                        role,
                        email,
                        password_hash,
                        activated
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(email_conflict)?;

        Ok(User {
            id,
            created_at,
            version: 1,
            ..user.clone()
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let email = email.to_string();

        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, created_at, name, role, email, password_hash, activated, version
                FROM users
                WHERE email = ?1
                "#,
            )?;

            let user = stmt
                .query_row([&email], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        created_at: parse_datetime(row.get(1)?),
                        name: row.get(2)?,
                        role: row.get(3)?,
                        email: row.get(4)?,
                        password: Password::from_hash(row.get::<_, String>(5)?),
                        activated: row.get(6)?,
                        version: row.get(7)?,
                    })
                })
                .optional()?;

            Ok(user)
        })
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, user: &User) -> Result<User, StoreError> {
        let name = user.name.clone();
        let email = user.email.clone();
        let password_hash = user.password.hash().to_string();
        let activated = user.activated;
        let id = user.id;
        let version = user.version;

        // The conditional write matches on both the key and the version the
        // caller read; the affected-row count is the explicit outcome.
        let rows_affected = self
            .call(move |conn| {
                let count = conn.execute(
                    r#"
                    UPDATE users
                    SET name = ?1, email = ?2, password_hash = ?3, activated = ?4,
                        version = version + 1
                    WHERE id = ?5 AND version = ?6
                    "#,
                    rusqlite::params![name, email, password_hash, activated, id, version],
                )?;
                Ok(count)
            })
            .await
            .map_err(email_conflict)?;

        if rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        Ok(User {
            version: user.version + 1,
            ..user.clone()
        })
    }

    async fn get_user_for_token(
        &self,
        scope: TokenScope,
        token_hash: &str,
    ) -> Result<User, StoreError> {
        let token_hash = token_hash.to_string();
        let now = Utc::now().to_rfc3339();

        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT users.id, users.created_at, users.name, users.role, users.email,
                       users.password_hash, users.activated, users.version
                FROM users
                INNER JOIN tokens ON users.id = tokens.user_id
                WHERE tokens.hash = ?1
                  AND tokens.scope = ?2
                  AND tokens.expiry > ?3
                "#,
            )?;

            let user = stmt
                .query_row(
                    rusqlite::params![token_hash, scope.as_str(), now],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            created_at: parse_datetime(row.get(1)?),
                            name: row.get(2)?,
                            role: row.get(3)?,
                            email: row.get(4)?,
                            password: Password::from_hash(row.get::<_, String>(5)?),
                            activated: row.get(6)?,
                            version: row.get(7)?,
                        })
                    },
                )
                .optional()?;

            Ok(user)
        })
        .await?
        .ok_or(StoreError::NotFound)
    }

    // =========================================================================
    // Permission operations
    // =========================================================================

    async fn permissions_for_user(&self, user_id: i64) -> Result<Permissions, StoreError> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT permissions.code
                FROM permissions
                INNER JOIN users_permissions
                    ON users_permissions.permission_id = permissions.id
                WHERE users_permissions.user_id = ?1
                ORDER BY permissions.code
                "#,
            )?;

            let codes = stmt
                .query_map([user_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Permissions::new(codes))
        })
        .await
    }

    async fn grant_permission(&self, user_id: i64, code: &str) -> Result<(), StoreError> {
        let code = code.to_string();

        self.call(move |conn| {
            conn.execute(
                r#"
                INSERT OR IGNORE INTO users_permissions (user_id, permission_id)
                SELECT ?1, id FROM permissions WHERE code = ?2
                "#,
                rusqlite::params![user_id, code],
            )?;
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Token operations
    // =========================================================================

    async fn insert_token(&self, token: &Token) -> Result<(), StoreError> {
        let hash = token.hash.clone();
        let user_id = token.user_id;
        let expiry = token.expiry.to_rfc3339();
        let scope = token.scope;

        self.call(move |conn| {
            conn.execute(
                r#"
                INSERT INTO tokens (hash, user_id, expiry, scope)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                rusqlite::params![hash, user_id, expiry, scope.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<(), StoreError> {
        self.call(move |conn| {
            conn.execute(
                "DELETE FROM tokens WHERE scope = ?1 AND user_id = ?2",
                rusqlite::params![scope.as_str(), user_id],
            )?;
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Toy operations
    // =========================================================================

    async fn insert_toy(&self, toy: &Toy) -> Result<Toy, StoreError> {
        let created_at = Utc::now();
        let title = toy.title.clone();
        let description = toy.description.clone();
        let details = to_json(&toy.details);
        let skills = to_json(&toy.skills);
        let categories = to_json(&toy.categories);
        let images = to_json(&toy.images);
        let recommended_age = toy.recommended_age.clone();
        let manufacturer = toy.manufacturer.clone();
        let value = toy.value;
        let is_available = toy.is_available;
        let wait_list = to_json(&toy.wait_list);

        let id = self
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO toys
                    (created_at, title, description, details, skills, categories, images,
                     recommended_age, manufacturer, value, is_available, wait_list)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    "#,
                    rusqlite::params![
                        created_at.to_rfc3339(),
                        title,
                        description,
                        details,
                        skills,
                        categories,
                        images,
                        recommended_age,
                        manufacturer,
                        value,
                        is_available,
                        wait_list
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(Toy {
            id,
            created_at,
            version: 1,
            ..toy.clone()
        })
    }

    async fn get_toy(&self, id: i64) -> Result<Toy, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, created_at, title, description, details, skills, categories, images,
                       recommended_age, manufacturer, value, is_available, wait_list, version
                FROM toys
                WHERE id = ?1
                "#,
            )?;

            let toy = stmt
                .query_row([id], |row| {
                    Ok(Toy {
                        id: row.get(0)?,
                        created_at: parse_datetime(row.get(1)?),
                        title: row.get(2)?,
                        description: row.get(3)?,
                        details: from_json(row.get(4)?),
                        skills: from_json(row.get(5)?),
                        categories: from_json(row.get(6)?),
                        images: from_json(row.get(7)?),
                        recommended_age: row.get(8)?,
                        manufacturer: row.get(9)?,
                        value: row.get(10)?,
                        is_available: row.get(11)?,
                        wait_list: from_json(row.get(12)?),
                        version: row.get(13)?,
                    })
                })
                .optional()?;

            Ok(toy)
        })
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_toy(&self, toy: &Toy) -> Result<Toy, StoreError> {
        let title = toy.title.clone();
        let description = toy.description.clone();
        let details = to_json(&toy.details);
        let skills = to_json(&toy.skills);
        let categories = to_json(&toy.categories);
        let images = to_json(&toy.images);
        let recommended_age = toy.recommended_age.clone();
        let manufacturer = toy.manufacturer.clone();
        let value = toy.value;
        let is_available = toy.is_available;
        let wait_list = to_json(&toy.wait_list);
        let id = toy.id;
        let version = toy.version;

        let rows_affected = self
            .call(move |conn| {
                let count = conn.execute(
                    r#"
                    UPDATE toys
                    SET title = ?1, description = ?2, details = ?3, skills = ?4,
                        categories = ?5, images = ?6, recommended_age = ?7,
                        manufacturer = ?8, value = ?9, is_available = ?10, wait_list = ?11,
                        version = version + 1
                    WHERE id = ?12 AND version = ?13
                    "#,
                    rusqlite::params![
                        title,
                        description,
                        details,
                        skills,
                        categories,
                        images,
                        recommended_age,
                        manufacturer,
                        value,
                        is_available,
                        wait_list,
                        id,
                        version
                    ],
                )?;
                Ok(count)
            })
            .await?;

        if rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        Ok(Toy {
            version: toy.version + 1,
            ..toy.clone()
        })
    }

    async fn delete_toy(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let rows_affected = self
            .call(move |conn| {
                let count = conn.execute("DELETE FROM toys WHERE id = ?1", [id])?;
                Ok(count)
            })
            .await?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn list_toys(
        &self,
        filter: &ToyFilter,
    ) -> Result<(Vec<Toy>, PageMetadata), StoreError> {
        let title = filter.title.clone();
        let categories = to_json(&filter.categories);
        let skills = to_json(&filter.skills);
        let value_from = filter.value_from;
        let value_to = filter.value_to;
        let limit = filter.limit();
        let offset = filter.offset();
        let page = filter.page;
        let page_size = filter.page_size;

        // The sort fragments come from the validated safelist, never from raw
        // client input.
        let query = format!(
            r#"
            SELECT COUNT(*) OVER (), id, created_at, title, description, details, skills,
                   categories, images, recommended_age, manufacturer, value, is_available,
                   wait_list, version
            FROM toys
            WHERE (title LIKE '%' || ?1 || '%' OR ?1 = '')
              AND (value BETWEEN ?2 AND ?3)
              AND (?4 = '[]' OR NOT EXISTS (
                    SELECT 1 FROM json_each(?4) AS want
                    WHERE NOT EXISTS (
                        SELECT 1 FROM json_each(toys.categories) AS have
                        WHERE have.value = want.value)))
              AND (?5 = '[]' OR NOT EXISTS (
                    SELECT 1 FROM json_each(?5) AS want
                    WHERE NOT EXISTS (
                        SELECT 1 FROM json_each(toys.skills) AS have
                        WHERE have.value = want.value)))
            ORDER BY {} {}, id ASC
            LIMIT ?6 OFFSET ?7
            "#,
            filter.sort_column(),
            filter.sort_direction()
        );

        self.call(move |conn| {
            let mut stmt = conn.prepare(&query)?;

            let mut total_records: i64 = 0;
            let toys = stmt
                .query_map(
                    rusqlite::params![title, value_from, value_to, categories, skills, limit, offset],
                    |row| {
                        total_records = row.get(0)?;
                        Ok(Toy {
                            id: row.get(1)?,
                            created_at: parse_datetime(row.get(2)?),
                            title: row.get(3)?,
                            description: row.get(4)?,
                            details: from_json(row.get(5)?),
                            skills: from_json(row.get(6)?),
                            categories: from_json(row.get(7)?),
                            images: from_json(row.get(8)?),
                            recommended_age: row.get(9)?,
                            manufacturer: row.get(10)?,
                            value: row.get(11)?,
                            is_available: row.get(12)?,
                            wait_list: from_json(row.get(13)?),
                            version: row.get(14)?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;

            let metadata = PageMetadata::calculate(total_records, page, page_size);

            Ok((toys, metadata))
        })
        .await
    }

    // =========================================================================
    // Comment operations
    // =========================================================================

    async fn insert_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        let created_at = Utc::now();
        let toy_id = comment.toy_id;
        let user_name = comment.user_name.clone();
        let text = comment.text.clone();
        let rating = comment.rating.value();

        let id = self
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO comments (created_at, toy_id, user_name, text, rating)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    rusqlite::params![created_at.to_rfc3339(), toy_id, user_name, text, rating],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(Comment {
            id,
            created_at,
            ..comment.clone()
        })
    }

    async fn comments_for_toy(&self, toy_id: i64) -> Result<Vec<Comment>, StoreError> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, created_at, toy_id, user_name, text, rating
                FROM comments
                WHERE toy_id = ?1
                ORDER BY id ASC
                "#,
            )?;

            let comments = stmt
                .query_map([toy_id], |row| {
                    Ok(Comment {
                        id: row.get(0)?,
                        created_at: parse_datetime(row.get(1)?),
                        toy_id: row.get(2)?,
                        user_name: row.get(3)?,
                        text: row.get(4)?,
                        rating: Rating::new(row.get(5)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(comments)
        })
        .await
    }
}

/// Map a unique-index violation to [`StoreError::DuplicateEmail`]
///
/// The check inspects the structured SQLite error code; `users.email` is the
/// only unique index the user writes can trip.
fn email_conflict(err: StoreError) -> StoreError {
    match err {
        StoreError::Sqlite(e) if is_unique_violation(&e) => StoreError::DuplicateEmail,
        other => other,
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
}

/// Parse a stored RFC 3339 datetime
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Encode a string list as a JSON text column
fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON text column into a string list
fn from_json(s: String) -> Vec<String> {
    serde_json::from_str(&s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn sample_user(email: &str) -> User {
        User {
            id: 0,
            created_at: Utc::now(),
            name: "Aruzhan".to_string(),
            role: "member".to_string(),
            email: email.to_string(),
            password: Password::from_hash("$2b$12$abcdefghijklmnopqrstuv"),
            activated: false,
            version: 0,
        }
    }

    fn sample_toy(title: &str, value: i64) -> Toy {
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

    fn sample_token(user_id: i64, scope: TokenScope, expiry: DateTime<Utc>) -> Token {
        Token {
            plaintext: String::new(),
            hash: format!("hash-{}-{}", user_id, scope),
            user_id,
            expiry,
            scope,
        }
    }

    // Test 1: Create in-memory store
    #[tokio::test]
    async fn test_create_in_memory_store() {
        let store = SqliteStore::in_memory().await;
        assert!(store.is_ok());
    }

    // Test 2: Inserted users start at version 1
    #[tokio::test]
    async fn test_insert_user_version_one() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.version, 1);
    }

    // Test 3: Duplicate email fails with DuplicateEmail
    #[tokio::test]
    async fn test_insert_duplicate_email() {
        let store = SqliteStore::in_memory().await.unwrap();

        store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();
        let result = store.insert_user(&sample_user("aruzhan@example.com")).await;

        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    // Test 4: Lookup by email round-trips; unknown email is NotFound
    #[tokio::test]
    async fn test_get_user_by_email() {
        let store = SqliteStore::in_memory().await.unwrap();

        store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();

        let user = store.get_user_by_email("aruzhan@example.com").await.unwrap();
        assert_eq!(user.name, "Aruzhan");
        assert_eq!(user.version, 1);

        let result = store.get_user_by_email("nobody@example.com").await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    // Test 5: Updates bump the version by exactly one
    #[tokio::test]
    async fn test_update_user_bumps_version() {
        let store = SqliteStore::in_memory().await.unwrap();

        let mut user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();
        user.activated = true;

        let updated = store.update_user(&user).await.unwrap();
        assert_eq!(updated.version, 2);

        let reloaded = store.get_user_by_email("aruzhan@example.com").await.unwrap();
        assert!(reloaded.activated);
        assert_eq!(reloaded.version, 2);
    }

    // Test 6: A stale version fails with EditConflict
    #[tokio::test]
    async fn test_update_user_stale_version() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();

        // First writer wins
        store.update_user(&user).await.unwrap();

        // Second writer still holds version 1
        let result = store.update_user(&user).await;
        assert!(matches!(result, Err(StoreError::EditConflict)));
    }

    // Test 7: Updating onto a taken email fails with DuplicateEmail
    #[tokio::test]
    async fn test_update_user_duplicate_email() {
        let store = SqliteStore::in_memory().await.unwrap();

        store
            .insert_user(&sample_user("first@example.com"))
            .await
            .unwrap();
        let mut second = store
            .insert_user(&sample_user("second@example.com"))
            .await
            .unwrap();

        second.email = "first@example.com".to_string();
        let result = store.update_user(&second).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    // Test 8: Token resolution misses uniformly
    //
    // Unknown hash, wrong scope and expired token are indistinguishable to
    // the caller.
    #[tokio::test]
    async fn test_get_user_for_token_uniform_miss() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();

        let live = sample_token(
            user.id,
            TokenScope::Authentication,
            Utc::now() + ChronoDuration::hours(1),
        );
        store.insert_token(&live).await.unwrap();

        // Correct hash and scope resolves
        let found = store
            .get_user_for_token(TokenScope::Authentication, &live.hash)
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        // Unknown hash
        let result = store
            .get_user_for_token(TokenScope::Authentication, "no-such-hash")
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        // Correct hash, wrong scope
        let result = store
            .get_user_for_token(TokenScope::Activation, &live.hash)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        // Expired token
        let expired = Token {
            hash: "expired-hash".to_string(),
            expiry: Utc::now() - ChronoDuration::hours(1),
            ..live.clone()
        };
        store.insert_token(&expired).await.unwrap();
        let result = store
            .get_user_for_token(TokenScope::Authentication, "expired-hash")
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    // Test 9: Revocation removes only the requested scope
    #[tokio::test]
    async fn test_delete_tokens_for_user_scoped() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();
        let expiry = Utc::now() + ChronoDuration::hours(1);

        let auth = sample_token(user.id, TokenScope::Authentication, expiry);
        let activation = sample_token(user.id, TokenScope::Activation, expiry);
        store.insert_token(&auth).await.unwrap();
        store.insert_token(&activation).await.unwrap();

        store
            .delete_tokens_for_user(TokenScope::Activation, user.id)
            .await
            .unwrap();

        let result = store
            .get_user_for_token(TokenScope::Activation, &activation.hash)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        // The authentication token survives
        assert!(store
            .get_user_for_token(TokenScope::Authentication, &auth.hash)
            .await
            .is_ok());
    }

    // Test 10: Permission grants and lookups
    #[tokio::test]
    async fn test_permissions() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store
            .insert_user(&sample_user("aruzhan@example.com"))
            .await
            .unwrap();

        assert!(store
            .permissions_for_user(user.id)
            .await
            .unwrap()
            .is_empty());

        store.grant_permission(user.id, "toys:read").await.unwrap();
        store.grant_permission(user.id, "toys:comment").await.unwrap();
        // Granting twice is a no-op
        store.grant_permission(user.id, "toys:read").await.unwrap();
        // Granting an unknown code is a no-op too
        store.grant_permission(user.id, "toys:fly").await.unwrap();

        let perms = store.permissions_for_user(user.id).await.unwrap();
        assert_eq!(perms.len(), 2);
        assert!(perms.includes("toys:read"));
        assert!(perms.includes("toys:comment"));
        assert!(!perms.includes("toys:write"));
    }

    // Test 11: Toy insert and fetch; non-positive IDs short-circuit
    #[tokio::test]
    async fn test_toy_insert_and_get() {
        let store = SqliteStore::in_memory().await.unwrap();

        let toy = store
            .insert_toy(&sample_toy("Wooden blocks", 4500))
            .await
            .unwrap();
        assert!(toy.id > 0);
        assert_eq!(toy.version, 1);

        let fetched = store.get_toy(toy.id).await.unwrap();
        assert_eq!(fetched.title, "Wooden blocks");
        assert_eq!(fetched.skills, vec!["motor"]);

        assert!(matches!(store.get_toy(0).await, Err(StoreError::NotFound)));
        assert!(matches!(store.get_toy(-5).await, Err(StoreError::NotFound)));
        assert!(matches!(store.get_toy(9999).await, Err(StoreError::NotFound)));
    }

    // Test 12: Toy updates are version-matched
    #[tokio::test]
    async fn test_toy_update_conflict() {
        let store = SqliteStore::in_memory().await.unwrap();

        let mut toy = store
            .insert_toy(&sample_toy("Wooden blocks", 4500))
            .await
            .unwrap();

        toy.value = 5000;
        let updated = store.update_toy(&toy).await.unwrap();
        assert_eq!(updated.version, 2);

        // The stale copy loses
        let result = store.update_toy(&toy).await;
        assert!(matches!(result, Err(StoreError::EditConflict)));
    }

    // Test 13: Deleting a missing toy is NotFound
    #[tokio::test]
    async fn test_toy_delete() {
        let store = SqliteStore::in_memory().await.unwrap();

        let toy = store
            .insert_toy(&sample_toy("Wooden blocks", 4500))
            .await
            .unwrap();

        store.delete_toy(toy.id).await.unwrap();
        assert!(matches!(
            store.delete_toy(toy.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete_toy(0).await, Err(StoreError::NotFound)));
    }

    // Test 14: Listing filters by category and paginates
    #[tokio::test]
    async fn test_list_toys() {
        let store = SqliteStore::in_memory().await.unwrap();

        let mut blocks = sample_toy("Wooden blocks", 4500);
        blocks.categories = vec!["construction".to_string(), "wood".to_string()];
        store.insert_toy(&blocks).await.unwrap();

        let mut doll = sample_toy("Rag doll", 3000);
        doll.categories = vec!["plush".to_string()];
        store.insert_toy(&doll).await.unwrap();

        let mut robot = sample_toy("Robot kit", 90_000);
        robot.categories = vec!["construction".to_string(), "electronics".to_string()];
        store.insert_toy(&robot).await.unwrap();

        // Category containment
        let mut filter = ToyFilter::default();
        filter.categories = vec!["construction".to_string()];
        let (toys, meta) = store.list_toys(&filter).await.unwrap();
        assert_eq!(toys.len(), 2);
        assert_eq!(meta.total_records, 2);

        // Price window
        let mut filter = ToyFilter::default();
        filter.value_to = 5000;
        let (toys, _) = store.list_toys(&filter).await.unwrap();
        assert_eq!(toys.len(), 2);

        // Title match
        let mut filter = ToyFilter::default();
        filter.title = "doll".to_string();
        let (toys, _) = store.list_toys(&filter).await.unwrap();
        assert_eq!(toys.len(), 1);
        assert_eq!(toys[0].title, "Rag doll");

        // Pagination
        let mut filter = ToyFilter::default();
        filter.page_size = 2;
        filter.sort = "value".to_string();
        let (toys, meta) = store.list_toys(&filter).await.unwrap();
        assert_eq!(toys.len(), 2);
        assert_eq!(toys[0].title, "Rag doll");
        assert_eq!(meta.total_records, 3);
        assert_eq!(meta.last_page, 2);

        filter.page = 2;
        let (toys, _) = store.list_toys(&filter).await.unwrap();
        assert_eq!(toys.len(), 1);
        assert_eq!(toys[0].title, "Robot kit");
    }

    // Test 15: Comments round-trip with their rating
    #[tokio::test]
    async fn test_comments() {
        let store = SqliteStore::in_memory().await.unwrap();

        let toy = store
            .insert_toy(&sample_toy("Wooden blocks", 4500))
            .await
            .unwrap();

        let comment = Comment {
            id: 0,
            created_at: Utc::now(),
            toy_id: toy.id,
            user_name: "Aruzhan".to_string(),
            text: "My kid loves it".to_string(),
            rating: Rating::new(5),
        };

        let stored = store.insert_comment(&comment).await.unwrap();
        assert!(stored.id > 0);

        let comments = store.comments_for_toy(toy.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].rating, Rating::new(5));
        assert_eq!(comments[0].user_name, "Aruzhan");

        assert!(store.comments_for_toy(9999).await.unwrap().is_empty());
    }
}
