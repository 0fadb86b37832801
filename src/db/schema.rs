//! Database schema and migrations.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- SHA-1 hex digest
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: file nodes (folders, files, images)
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    type        TEXT NOT NULL,           -- 'folder', 'file', 'image'
    is_public   INTEGER NOT NULL DEFAULT 0,
    parent_id   INTEGER NOT NULL DEFAULT 0,  -- 0 = root
    local_path  TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_user_parent ON files(user_id, parent_id);
"#,
    // v3: durable job queue
    r#"
CREATE TABLE jobs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    queue       TEXT NOT NULL,
    payload     TEXT NOT NULL,           -- JSON
    status      TEXT NOT NULL DEFAULT 'waiting',  -- 'waiting', 'active', 'completed', 'failed'
    attempts    INTEGER NOT NULL DEFAULT 0,
    error       TEXT,
    claimed_at  INTEGER,                 -- unix millis of the current claim
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    finished_at TEXT
);

CREATE INDEX idx_jobs_queue_status ON jobs(queue, status, id);
"#,
];
