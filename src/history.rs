//! Append-only query log backed by SQLite

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::recovery::RecoveryResult;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS recoveries (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    broken_code TEXT NOT NULL,
    suggested_file TEXT,
    similarity_score REAL,
    error TEXT
)";

/// One logged recovery request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub broken_code: String,
    pub suggested_file: Option<String>,
    pub similarity_score: Option<f32>,
    pub error: Option<String>,
}

impl QueryRecord {
    pub fn success(broken_code: &str, result: &RecoveryResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            broken_code: broken_code.to_string(),
            suggested_file: Some(result.suggested_file.clone()),
            similarity_score: Some(result.similarity_score),
            error: None,
        }
    }

    pub fn failure(broken_code: &str, error: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            broken_code: broken_code.to_string(),
            suggested_file: None,
            similarity_score: None,
            error: Some(error.to_string()),
        }
    }
}

/// Query log; rows are only ever inserted
pub struct QueryLog {
    conn: Connection,
}

impl QueryLog {
    /// Open (or create) the log at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open query log {:?}", path))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])
            .context("Failed to create query log schema")?;
        Ok(Self { conn })
    }

    /// Append a record
    pub fn record(&self, record: &QueryRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO recoveries (id, created_at, broken_code, suggested_file, similarity_score, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    record.broken_code,
                    record.suggested_file,
                    record.similarity_score.map(f64::from),
                    record.error,
                ],
            )
            .context("Failed to append to query log")?;
        Ok(())
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<QueryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, broken_code, suggested_file, similarity_score, error
             FROM recoveries ORDER BY rowid DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, created_at, broken_code, suggested_file, score, error) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .with_context(|| format!("Corrupt timestamp in query log: {}", created_at))?
                .with_timezone(&Utc);
            records.push(QueryRecord {
                id,
                created_at,
                broken_code,
                suggested_file,
                similarity_score: score.map(|s| s as f32),
                error,
            });
        }

        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recoveries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
