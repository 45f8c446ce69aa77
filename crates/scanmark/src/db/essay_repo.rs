//! Essay repository — per-submission rows and their grading lifecycle.
//!
//! Stage updates are single-statement writes keyed by essay id. Each sets
//! its destination status unconditionally: sequencing is the caller's
//! responsibility, and re-running a stage on the same input is idempotent.
//! Every update reports whether the row existed, so callers branch on
//! existence instead of catching errors.

use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

/// Essay lifecycle stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EssayStatus {
    Pending,
    Scrubbed,
    Normalized,
    Graded,
}

impl EssayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EssayStatus::Pending => "PENDING",
            EssayStatus::Scrubbed => "SCRUBBED",
            EssayStatus::Normalized => "NORMALIZED",
            EssayStatus::Graded => "GRADED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(EssayStatus::Pending),
            "SCRUBBED" => Some(EssayStatus::Scrubbed),
            "NORMALIZED" => Some(EssayStatus::Normalized),
            "GRADED" => Some(EssayStatus::Graded),
            _ => None,
        }
    }
}

/// Typed provenance metadata for an essay, stored as one JSON blob.
/// Unknown keys survive round-trips through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EssayMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A raw essay row from the database.
#[derive(Debug, Clone)]
pub struct EssayRow {
    pub id: i64,
    pub job_id: String,
    pub student_name: Option<String>,
    pub raw_text: Option<String>,
    pub scrubbed_text: Option<String>,
    pub normalized_text: Option<String>,
    pub evaluation: Option<String>,
    pub grade: Option<String>,
    pub status: String,
    pub metadata: Option<String>,
}

impl EssayRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            student_name: row.get("student_name")?,
            raw_text: row.get("raw_text")?,
            scrubbed_text: row.get("scrubbed_text")?,
            normalized_text: row.get("normalized_text")?,
            evaluation: row.get("evaluation")?,
            grade: row.get("grade")?,
            status: row.get("status")?,
            metadata: row.get("metadata")?,
        })
    }

    pub fn parsed_status(&self) -> Option<EssayStatus> {
        EssayStatus::parse(&self.status)
    }

    pub fn parsed_metadata(&self) -> Option<EssayMetadata> {
        self.metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// The best text available for downstream stages:
    /// normalized, else scrubbed, else raw.
    pub fn best_text(&self) -> Option<&str> {
        [
            self.normalized_text.as_deref(),
            self.scrubbed_text.as_deref(),
            self.raw_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
    }
}

/// Adds a new essay record to a job and returns its id.
pub fn insert(
    db: &Database,
    job_id: &str,
    student_name: Option<&str>,
    raw_text: &str,
    metadata: Option<&EssayMetadata>,
) -> Result<i64, DatabaseError> {
    let metadata_json = metadata.map(serde_json::to_string).transpose()?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO essays (job_id, student_name, raw_text, metadata)
             VALUES (?1, ?2, ?3, ?4)",
            params![job_id, student_name, raw_text, metadata_json],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds an essay by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<EssayRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM essays WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], EssayRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All essays for a job, in insertion order.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<EssayRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM essays WHERE job_id = ?1 ORDER BY id ASC")?;
        let rows = stmt
            .query_map(params![job_id], EssayRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Stores scrubbed text and moves the essay to SCRUBBED.
pub fn update_scrubbed(
    db: &Database,
    essay_id: i64,
    scrubbed_text: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE essays SET scrubbed_text = ?1, status = 'SCRUBBED' WHERE id = ?2",
            params![scrubbed_text, essay_id],
        )?;
        Ok(changed > 0)
    })
}

/// Stores normalized text and moves the essay to NORMALIZED.
pub fn update_normalized(
    db: &Database,
    essay_id: i64,
    normalized_text: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE essays SET normalized_text = ?1, status = 'NORMALIZED' WHERE id = ?2",
            params![normalized_text, essay_id],
        )?;
        Ok(changed > 0)
    })
}

/// Stores the serialized evaluation plus derived grade and moves the
/// essay to GRADED — regardless of its prior status.
pub fn update_evaluation(
    db: &Database,
    essay_id: i64,
    evaluation_json: &str,
    grade: Option<&str>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE essays SET evaluation = ?1, grade = ?2, status = 'GRADED' WHERE id = ?3",
            params![evaluation_json, grade, essay_id],
        )?;
        Ok(changed > 0)
    })
}

/// Corrects the student name only; text, grade, and status are preserved.
pub fn update_student_name(
    db: &Database,
    essay_id: i64,
    student_name: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE essays SET student_name = ?1 WHERE id = ?2",
            params![student_name, essay_id],
        )?;
        Ok(changed > 0)
    })
}
