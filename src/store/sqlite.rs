//! SQLite-backed keyword dictionary and policy archive.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::dictionary::KeywordEntry;
use crate::error::{PolicyLensError, Result};

use super::{AnalysisRecord, NewPolicy, PolicyId, PolicyRecord, RecordStore};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS privacy_keywords (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword TEXT NOT NULL,
        category TEXT NOT NULL,
        UNIQUE (keyword, category)
    );

    CREATE TABLE IF NOT EXISTS stored_policies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        source TEXT NOT NULL,
        filename TEXT,
        char_count INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS policy_analysis (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        policy_id INTEGER NOT NULL REFERENCES stored_policies(id) ON DELETE CASCADE,
        keyword_analysis TEXT NOT NULL,
        ai_summary TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_policy_analysis_policy ON policy_analysis(policy_id);
"#;

/// SQLite archive. The connection is guarded so the store can be shared behind `&self`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories as needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!("Opened policy archive at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PolicyLensError::PersistenceUnavailable {
                message: "database connection lock poisoned".to_string(),
            })
    }

    /// Look up a single policy by id
    pub fn get_policy(&self, id: PolicyId) -> Result<Option<PolicyRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, content, source, filename, char_count, created_at
                 FROM stored_policies WHERE id = ?1",
                params![id],
                policy_from_row,
            )
            .optional()?;
        Ok(record)
    }
}

fn now() -> String {
    // Fixed-width UTC timestamps sort lexicographically
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn policy_from_row(row: &Row<'_>) -> rusqlite::Result<PolicyRecord> {
    Ok(PolicyRecord {
        id: row.get("id")?,
        content: row.get("content")?,
        source: row.get("source")?,
        filename: row.get("filename")?,
        char_count: row.get::<_, i64>("char_count")?.max(0) as usize,
        created_at: row.get("created_at")?,
    })
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    Ok(AnalysisRecord {
        id: row.get("id")?,
        policy_id: row.get("policy_id")?,
        keyword_analysis: row.get("keyword_analysis")?,
        ai_summary: row.get("ai_summary")?,
        created_at: row.get("created_at")?,
    })
}

impl RecordStore for SqliteStore {
    fn list_keywords(&self) -> Result<Vec<KeywordEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT keyword, category FROM privacy_keywords ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(KeywordEntry::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;
        let keywords = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Keywords fetched: {}", keywords.len());
        Ok(keywords)
    }

    fn insert_keywords(&self, entries: &[KeywordEntry]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO privacy_keywords (keyword, category) VALUES (?1, ?2)",
            )?;
            for entry in entries {
                added += stmt.execute(params![entry.term, entry.category])?;
            }
        }
        tx.commit()?;
        info!("Inserted {} of {} keywords", added, entries.len());
        Ok(added)
    }

    fn store_policy(&self, policy: &NewPolicy<'_>) -> Result<PolicyId> {
        let conn = self.conn()?;
        let char_count = policy.content.chars().count() as i64;
        conn.execute(
            "INSERT INTO stored_policies (content, source, filename, char_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![policy.content, policy.source, policy.filename, char_count, now()],
        )?;
        let id = conn.last_insert_rowid();
        info!("Policy stored (id={}, characters={})", id, char_count);
        Ok(id)
    }

    fn list_policies(&self) -> Result<Vec<PolicyRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, content, source, filename, char_count, created_at
             FROM stored_policies ORDER BY created_at DESC, id DESC",
        )?;
        let policies = stmt
            .query_map([], policy_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Retrieved {} stored policies", policies.len());
        Ok(policies)
    }

    fn store_analysis(
        &self,
        policy_id: PolicyId,
        keyword_analysis: &str,
        ai_summary: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO policy_analysis (policy_id, keyword_analysis, ai_summary, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![policy_id, keyword_analysis, ai_summary, now()],
        )?;
        let id = conn.last_insert_rowid();
        info!("Analysis stored for policy ID: {}", policy_id);
        Ok(id)
    }

    fn list_analyses(&self, policy_id: PolicyId) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, policy_id, keyword_analysis, ai_summary, created_at
             FROM policy_analysis WHERE policy_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let analyses = stmt
            .query_map(params![policy_id], analysis_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(
            "Retrieved {} analysis results for policy ID: {}",
            analyses.len(),
            policy_id
        );
        Ok(analyses)
    }
}
