//! SQL migration definitions for the Prospector database.
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
        description: "Initial schema: prospects",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per persisted prospect; score columns are NULL until analyzed
CREATE TABLE IF NOT EXISTS prospects (
    id                TEXT PRIMARY KEY,
    company           TEXT NOT NULL,
    industry          TEXT NOT NULL,
    size              TEXT NOT NULL,
    description       TEXT NOT NULL,
    website           TEXT,
    job_postings_json TEXT NOT NULL DEFAULT '[]',
    tech_stack_json   TEXT NOT NULL DEFAULT '[]',
    issues_json       TEXT NOT NULL DEFAULT '[]',
    urgency           INTEGER,
    budget            INTEGER,
    fit               INTEGER,
    contactability    INTEGER,
    composite         INTEGER,
    rationale         TEXT,
    outreach_message  TEXT,
    status            TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    last_contacted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_prospects_composite ON prospects(composite);
CREATE INDEX IF NOT EXISTS idx_prospects_created_at ON prospects(created_at);
CREATE INDEX IF NOT EXISTS idx_prospects_status ON prospects(status);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
