//! Database schema for toyshelf
//!
//! The schema batch is idempotent; it runs on every startup.

/// Schema creation batch
pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at    TEXT    NOT NULL,
    name          TEXT    NOT NULL,
    role          TEXT    NOT NULL DEFAULT 'member',
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    activated     INTEGER NOT NULL DEFAULT 0,
    version       INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS tokens (
    hash    TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    expiry  TEXT    NOT NULL,
    scope   TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tokens_user_scope ON tokens (user_id, scope);

CREATE TABLE IF NOT EXISTS toys (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at      TEXT    NOT NULL,
    title           TEXT    NOT NULL,
    description     TEXT    NOT NULL DEFAULT '',
    details         TEXT    NOT NULL DEFAULT '[]',
    skills          TEXT    NOT NULL DEFAULT '[]',
    categories      TEXT    NOT NULL DEFAULT '[]',
    images          TEXT    NOT NULL DEFAULT '[]',
    recommended_age TEXT    NOT NULL DEFAULT '',
    manufacturer    TEXT    NOT NULL DEFAULT '',
    value           INTEGER NOT NULL,
    is_available    INTEGER NOT NULL DEFAULT 1,
    wait_list       TEXT    NOT NULL DEFAULT '[]',
    version         INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS comments (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT    NOT NULL,
    toy_id     INTEGER NOT NULL REFERENCES toys (id) ON DELETE CASCADE,
    user_name  TEXT    NOT NULL,
    text       TEXT    NOT NULL,
    rating     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_toy ON comments (toy_id);

CREATE TABLE IF NOT EXISTS permissions (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users_permissions (
    user_id       INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES permissions (id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, permission_id)
);

INSERT OR IGNORE INTO permissions (code) VALUES
    ('toys:read'),
    ('toys:write'),
    ('toys:comment');
"#;
