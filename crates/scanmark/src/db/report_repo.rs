//! Report repository — generated artifacts (PDFs, gradebooks, archives).
//!
//! Storage is append-only: regeneration inserts a new row and reads pick
//! the newest match, so a half-written regeneration can never clobber the
//! last good copy. Lookup key is `(job_id, report_type, essay_id-or-NULL)`.

use rusqlite::{params, Row};

use super::{now_timestamp, Database, DatabaseError};

/// Well-known report types. The column is free-form; these are the ones
/// the report generators produce today.
pub const GRADEBOOK_CSV: &str = "gradebook_csv";
pub const STUDENT_PDF: &str = "student_pdf";
pub const STUDENT_FEEDBACK_ZIP: &str = "student_feedback_zip";

/// A stored report with its metadata.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: i64,
    pub job_id: String,
    pub report_type: String,
    pub essay_id: Option<i64>,
    pub filename: Option<String>,
    pub content: Vec<u8>,
    pub created_at: String,
}

impl ReportRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            report_type: row.get("report_type")?,
            essay_id: row.get("essay_id")?,
            filename: row.get("filename")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Stores a generated report. Always inserts; never updates in place.
pub fn store(
    db: &Database,
    job_id: &str,
    report_type: &str,
    filename: &str,
    content: &[u8],
    essay_id: Option<i64>,
) -> Result<i64, DatabaseError> {
    let created_at = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO reports (job_id, report_type, essay_id, filename, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![job_id, report_type, essay_id, filename, content, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// The newest report matching the lookup key, with metadata.
///
/// The id tiebreak keeps "latest" deterministic when two regenerations
/// land on the same timestamp.
pub fn latest(
    db: &Database,
    job_id: &str,
    report_type: &str,
    essay_id: Option<i64>,
) -> Result<Option<ReportRow>, DatabaseError> {
    db.with_conn(|conn| {
        let result = match essay_id {
            Some(essay) => conn.query_row(
                "SELECT * FROM reports
                 WHERE job_id = ?1 AND report_type = ?2 AND essay_id = ?3
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![job_id, report_type, essay],
                ReportRow::from_row,
            ),
            None => conn.query_row(
                "SELECT * FROM reports
                 WHERE job_id = ?1 AND report_type = ?2 AND essay_id IS NULL
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![job_id, report_type],
                ReportRow::from_row,
            ),
        };

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::Sqlite(e)),
        }
    })
}

/// The newest report's bytes, or `None` if nothing matches.
pub fn latest_content(
    db: &Database,
    job_id: &str,
    report_type: &str,
    essay_id: Option<i64>,
) -> Result<Option<Vec<u8>>, DatabaseError> {
    Ok(latest(db, job_id, report_type, essay_id)?.map(|row| row.content))
}

/// The newest per-essay report of the given type, regardless of job.
pub fn latest_for_essay(
    db: &Database,
    essay_id: i64,
    report_type: &str,
) -> Result<Option<Vec<u8>>, DatabaseError> {
    db.with_conn(|conn| {
        let result = conn.query_row(
            "SELECT content FROM reports
             WHERE essay_id = ?1 AND report_type = ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![essay_id, report_type],
            |row| row.get::<_, Vec<u8>>(0),
        );
        match result {
            Ok(content) => Ok(Some(content)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::Sqlite(e)),
        }
    })
}

/// Deletes all reports for a job. Returns how many were removed.
pub fn delete_for_job(db: &Database, job_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute("DELETE FROM reports WHERE job_id = ?1", params![job_id])?;
        Ok(deleted)
    })
}
