//! SQL migration definitions for the Folio database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: items with unique slug",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Ingested pages. `slug` is nullable only so legacy rows can be backfilled;
-- the UNIQUE constraint is what closes the allocate-then-insert race.
CREATE TABLE IF NOT EXISTS items (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    date       TEXT NOT NULL,
    is_indexed INTEGER NOT NULL DEFAULT 0,
    author     TEXT NOT NULL DEFAULT 'Jamie Z',
    slug       TEXT UNIQUE,
    subject    TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_items_date ON items(date);
CREATE INDEX IF NOT EXISTS idx_items_subject ON items(subject);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
