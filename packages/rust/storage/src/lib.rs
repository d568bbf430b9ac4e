//! Prospect persistence.
//!
//! [`ProspectStore`] is the store interface the pipeline writes through.
//! Two implementations are provided:
//! - [`Storage`]: libSQL, either a local file or a remote `libsql://` database
//! - [`MemoryStore`]: in-process, for tests and dry runs
//!
//! Storage failures always surface as [`ProspectorError::Storage`]; callers
//! decide whether to abort.

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use prospector_shared::{
    CandidateRecord, PersistedProspect, ProspectId, ProspectorError, Result, Score, Status,
};

pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Persistence operations for prospects.
#[async_trait]
pub trait ProspectStore: Send + Sync {
    /// Persist a new prospect. Status is `analyzed` when a score is given,
    /// `discovered` otherwise. Returns the assigned identity.
    async fn create(&self, candidate: &CandidateRecord, score: Option<&Score>)
    -> Result<ProspectId>;

    /// Fetch a prospect by id.
    async fn get(&self, id: &ProspectId) -> Result<Option<PersistedProspect>>;

    /// Attach (or replace) the outreach message.
    async fn set_outreach_message(&self, id: &ProspectId, message: &str) -> Result<()>;

    /// Move a prospect to `status`. Moving to `contacted` stamps
    /// `last_contacted_at`.
    async fn set_status(&self, id: &ProspectId, status: Status) -> Result<()>;

    /// Most recently created prospects first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedProspect>>;

    /// Scored prospects with `composite >= min_score`, highest composite first.
    async fn list_by_min_score(&self, min_score: u8) -> Result<Vec<PersistedProspect>>;
}

// ---------------------------------------------------------------------------
// libSQL storage
// ---------------------------------------------------------------------------

const SELECT_COLUMNS: &str = "id, company, industry, size, description, website, \
     job_postings_json, tech_stack_json, issues_json, urgency, budget, fit, contactability, \
     composite, rationale, outreach_message, status, created_at, updated_at, last_contacted_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a local database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProspectorError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db).await
    }

    /// Open a local database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Connect to a remote libSQL database.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(storage_err)?;
        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ProspectorError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ProspectorError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    async fn query_prospects(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<PersistedProspect>> {
        let mut rows = self.conn.query(sql, params).await.map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_prospect(&row)?);
        }
        Ok(results)
    }

    fn ensure_updated(changed: u64, id: &ProspectId) -> Result<()> {
        if changed == 0 {
            return Err(ProspectorError::Storage(format!("prospect not found: {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProspectStore for Storage {
    async fn create(
        &self,
        candidate: &CandidateRecord,
        score: Option<&Score>,
    ) -> Result<ProspectId> {
        self.check_writable()?;
        let id = ProspectId::new();
        let now = now_stamp();
        let status = Status::initial(score);

        self.conn
            .execute(
                "INSERT INTO prospects (id, company, industry, size, description, website,
                   job_postings_json, tech_stack_json, issues_json,
                   urgency, budget, fit, contactability, composite, rationale,
                   status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    id.to_string(),
                    candidate.company.as_str(),
                    candidate.industry.as_str(),
                    candidate.size.as_str(),
                    candidate.description.as_str(),
                    candidate.website.as_deref(),
                    to_json(&candidate.job_postings)?,
                    to_json(&candidate.tech_stack)?,
                    to_json(&candidate.issues)?,
                    score.map(|s| i64::from(s.urgency)),
                    score.map(|s| i64::from(s.budget)),
                    score.map(|s| i64::from(s.fit)),
                    score.map(|s| i64::from(s.contactability)),
                    score.map(|s| i64::from(s.composite)),
                    score.map(|s| s.rationale.clone()),
                    status.as_str(),
                    now.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(%id, company = %candidate.company, %status, "prospect created");
        Ok(id)
    }

    async fn get(&self, id: &ProspectId) -> Result<Option<PersistedProspect>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM prospects WHERE id = ?1");
        let mut found = self.query_prospects(&sql, params![id.to_string()]).await?;
        Ok(found.pop())
    }

    async fn set_outreach_message(&self, id: &ProspectId, message: &str) -> Result<()> {
        self.check_writable()?;
        let now = now_stamp();
        let changed = self
            .conn
            .execute(
                "UPDATE prospects SET outreach_message = ?1, updated_at = ?2 WHERE id = ?3",
                params![message, now.as_str(), id.to_string()],
            )
            .await
            .map_err(storage_err)?;
        Self::ensure_updated(changed, id)
    }

    async fn set_status(&self, id: &ProspectId, status: Status) -> Result<()> {
        self.check_writable()?;
        let now = now_stamp();
        let changed = if status == Status::Contacted {
            self.conn
                .execute(
                    "UPDATE prospects SET status = ?1, updated_at = ?2, last_contacted_at = ?2
                     WHERE id = ?3",
                    params![status.as_str(), now.as_str(), id.to_string()],
                )
                .await
        } else {
            self.conn
                .execute(
                    "UPDATE prospects SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.as_str(), now.as_str(), id.to_string()],
                )
                .await
        }
        .map_err(storage_err)?;
        Self::ensure_updated(changed, id)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedProspect>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM prospects ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        self.query_prospects(&sql, params![limit as i64]).await
    }

    async fn list_by_min_score(&self, min_score: u8) -> Result<Vec<PersistedProspect>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM prospects
             WHERE composite IS NOT NULL AND composite >= ?1
             ORDER BY composite DESC, created_at DESC"
        );
        self.query_prospects(&sql, params![i64::from(min_score)]).await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Fixed-width RFC 3339 timestamp so text ordering matches time ordering.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn storage_err(e: impl std::fmt::Display) -> ProspectorError {
    ProspectorError::Storage(e.to_string())
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(storage_err)
}

fn from_json(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| ProspectorError::Storage(format!("invalid list column: {e}")))
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ProspectorError::Storage(format!("invalid date: {e}")))
}

fn score_column(row: &libsql::Row, idx: i32) -> Result<Option<u8>> {
    match row.get::<i64>(idx).ok() {
        None => Ok(None),
        Some(v) => u8::try_from(v)
            .map(Some)
            .map_err(|_| ProspectorError::Storage(format!("score column {idx} out of range: {v}"))),
    }
}

/// Convert a database row (selected with `SELECT_COLUMNS`) to a [`PersistedProspect`].
fn row_to_prospect(row: &libsql::Row) -> Result<PersistedProspect> {
    let id: String = row.get(0).map_err(storage_err)?;
    let id = id
        .parse::<ProspectId>()
        .map_err(|e| ProspectorError::Storage(format!("invalid prospect id '{id}': {e}")))?;

    let candidate = CandidateRecord {
        company: row.get(1).map_err(storage_err)?,
        industry: row.get(2).map_err(storage_err)?,
        size: row.get(3).map_err(storage_err)?,
        description: row.get(4).map_err(storage_err)?,
        website: row.get::<String>(5).ok(),
        job_postings: from_json(&row.get::<String>(6).map_err(storage_err)?)?,
        tech_stack: from_json(&row.get::<String>(7).map_err(storage_err)?)?,
        issues: from_json(&row.get::<String>(8).map_err(storage_err)?)?,
    };

    let score = match (
        score_column(row, 9)?,
        score_column(row, 10)?,
        score_column(row, 11)?,
        score_column(row, 12)?,
        score_column(row, 13)?,
    ) {
        (Some(urgency), Some(budget), Some(fit), Some(contactability), Some(composite)) => {
            Some(Score {
                urgency,
                budget,
                fit,
                contactability,
                composite,
                rationale: row.get::<String>(14).unwrap_or_default(),
            })
        }
        _ => None,
    };

    let status: String = row.get(16).map_err(storage_err)?;

    Ok(PersistedProspect {
        id,
        candidate,
        score,
        outreach_message: row.get::<String>(15).ok(),
        status: status.parse()?,
        created_at: parse_time(&row.get::<String>(17).map_err(storage_err)?)?,
        updated_at: parse_time(&row.get::<String>(18).map_err(storage_err)?)?,
        last_contacted_at: match row.get::<String>(19).ok() {
            Some(raw) => Some(parse_time(&raw)?),
            None => None,
        },
    })
}
