//! Job repository — CRUD operations for the `jobs` table.
//!
//! A job owns its essays and reports; deletion cascades over all three
//! tables explicitly, in dependency order, inside one transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{format_timestamp, now_timestamp, Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub created_at: String,
    pub status: String,
    pub name: Option<String>,
    pub rubric: Option<String>,
    pub question_text: Option<String>,
    pub essay_format: Option<String>,
    pub student_count: Option<u32>,
    pub knowledge_base_topic: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            status: row.get("status")?,
            name: row.get("name")?,
            rubric: row.get("rubric")?,
            question_text: row.get("question_text")?,
            essay_format: row.get("essay_format")?,
            student_count: row.get("student_count")?,
            knowledge_base_topic: row.get("knowledge_base_topic")?,
        })
    }
}

/// Optional grading materials attached to a job at creation.
#[derive(Debug, Default, Clone)]
pub struct JobMaterials {
    pub name: Option<String>,
    pub rubric: Option<String>,
    pub question_text: Option<String>,
    pub essay_format: Option<String>,
    pub student_count: Option<u32>,
    pub knowledge_base_topic: Option<String>,
}

/// Generates a fresh job id: `job_<YYYYMMDD_HHMMSS>_<8-char suffix>`.
/// Ids are minted once and never reused.
pub fn new_job_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("job_{}_{}", timestamp, &suffix[..8])
}

/// Creates a new job row and returns its id.
pub fn create(db: &Database, materials: &JobMaterials) -> Result<String, DatabaseError> {
    let job_id = new_job_id();
    let created_at = now_timestamp();

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs
             (id, created_at, name, rubric, question_text, essay_format, student_count, knowledge_base_topic)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                job_id,
                created_at,
                materials.name,
                materials.rubric,
                materials.question_text,
                materials.essay_format,
                materials.student_count,
                materials.knowledge_base_topic,
            ],
        )?;
        Ok(())
    })?;

    Ok(job_id)
}

/// Finds a job by its id.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Deletes a job and everything it owns. Returns whether the job
/// existed; deleting an unknown id performs no writes.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let exists: bool = conn
            .query_row("SELECT 1 FROM jobs WHERE id = ?1", params![id], |_| Ok(()))
            .map(|_| true)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;
        if !exists {
            return Ok(false);
        }

        // Explicit cascade in dependency order; the foreign keys are
        // informational, not relied on for cleanup.
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM reports WHERE job_id = ?1", params![id])?;
        tx.execute("DELETE FROM essays WHERE job_id = ?1", params![id])?;
        tx.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        tx.commit()?;

        log::info!("Deleted job {} with its essays and reports", id);
        Ok(true)
    })
}

/// Ids of jobs created before the cutoff. Pure read; deletion is a
/// separate, per-job step so one failure cannot block the rest.
pub fn old_job_ids(db: &Database, cutoff: DateTime<Utc>) -> Result<Vec<String>, DatabaseError> {
    let cutoff_ts = format_timestamp(&cutoff);
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM jobs WHERE created_at < ?1")?;
        let ids = stmt
            .query_map(params![cutoff_ts], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}

/// One job returned by `search`, with up to three match snippets.
#[derive(Debug, Clone)]
pub struct JobSearchHit {
    pub id: String,
    pub created_at: String,
    pub name: Option<String>,
    pub status: String,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub reason: &'static str,
    pub snippet: String,
}

/// Searches jobs by keyword over student names, essay text, and job
/// names, newest first, optionally bounded by creation date.
pub fn search(
    db: &Database,
    query: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<Vec<JobSearchHit>, DatabaseError> {
    let mut sql = String::from(
        "SELECT DISTINCT
            j.id, j.created_at, j.name, j.status,
            e.student_name, e.raw_text
         FROM jobs j
         JOIN essays e ON j.id = e.job_id
         WHERE (e.student_name LIKE ?1 OR e.raw_text LIKE ?1 OR j.name LIKE ?1)",
    );
    let like = format!("%{}%", query);
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(like)];

    if let Some(start) = start_date {
        sql.push_str(&format!(" AND j.created_at >= ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(start.to_string()));
    }
    if let Some(end) = end_date {
        sql.push_str(&format!(" AND j.created_at <= ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(end.to_string()));
    }
    sql.push_str(" ORDER BY j.created_at DESC");

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            Ok((
                row.get::<_, String>("id")?,
                row.get::<_, String>("created_at")?,
                row.get::<_, Option<String>>("name")?,
                row.get::<_, String>("status")?,
                row.get::<_, Option<String>>("student_name")?,
                row.get::<_, Option<String>>("raw_text")?,
            ))
        })?;

        let mut hits: Vec<JobSearchHit> = Vec::new();
        let query_lower = query.to_lowercase();

        for row in rows {
            let (id, created_at, name, status, student_name, raw_text) = row?;

            let position = match hits.iter().position(|h| h.id == id) {
                Some(p) => p,
                None => {
                    hits.push(JobSearchHit {
                        id: id.clone(),
                        created_at,
                        name: name.clone(),
                        status,
                        matches: Vec::new(),
                    });
                    hits.len() - 1
                }
            };

            if hits[position].matches.len() >= 3 {
                continue;
            }

            let student = student_name.unwrap_or_default();
            let job_name = name.unwrap_or_default();
            let matched = if student.to_lowercase().contains(&query_lower) {
                SearchMatch {
                    reason: "Student Name Match",
                    snippet: student,
                }
            } else if job_name.to_lowercase().contains(&query_lower) {
                SearchMatch {
                    reason: "Job Name Match",
                    snippet: job_name,
                }
            } else {
                SearchMatch {
                    reason: "Content Match",
                    snippet: snippet_around(&raw_text.unwrap_or_default(), &query_lower),
                }
            };
            hits[position].matches.push(matched);
        }

        Ok(hits)
    })
}

/// Roughly 30 characters of context either side of the first match.
/// Offsets are clamped to char boundaries so multibyte text never panics.
fn snippet_around(text: &str, query_lower: &str) -> String {
    let lower = text.to_lowercase();
    let Some(index) = lower.find(query_lower) else {
        return text.chars().take(60).collect();
    };

    let mut start = index.saturating_sub(30).min(text.len());
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (index + query_lower.len() + 30).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }

    format!("...{}...", &text[start..end])
}
