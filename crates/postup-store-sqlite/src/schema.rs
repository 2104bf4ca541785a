//! SQL schema for the postup SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Posts are never updated. Expired rows stay until their owner deletes them.
CREATE TABLE IF NOT EXISTS posts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    activity      TEXT    NOT NULL,
    location      TEXT    NOT NULL,
    latitude      REAL    NOT NULL,
    longitude     REAL    NOT NULL,
    hours         INTEGER NOT NULL CHECK (hours BETWEEN 1 AND 24),
    neighborhood  TEXT,
    locality      TEXT,
    district      TEXT,
    created_at    TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    start_time    TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    expires_at    TEXT    NOT NULL,   -- start_time + hours; filter column
    session_id    TEXT    NOT NULL    -- owning anonymous session
);

CREATE TABLE IF NOT EXISTS notification_subscriptions (
    endpoint    TEXT PRIMARY KEY,
    p256dh      TEXT NOT NULL,
    auth        TEXT NOT NULL,
    session_id  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_expires_idx ON posts(expires_at);
CREATE INDEX IF NOT EXISTS posts_session_idx ON posts(session_id);

PRAGMA user_version = 1;
";
