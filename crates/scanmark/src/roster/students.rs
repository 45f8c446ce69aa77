//! Student roster with per-student records.
//!
//! Built from `school_names.csv`, keyed by normalized full name. Used by
//! delivery steps that need an email address for a detected student name,
//! and for suggesting roster matches when OCR mangled a name.

use std::collections::HashMap;
use std::path::Path;

use crate::error::RosterError;
use crate::roster::loader::{read_school_records, SCHOOL_NAMES_FILE};
use crate::roster::registry::normalize_name;

#[derive(Debug, Clone)]
pub struct StudentInfo {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub grade: String,
    pub email: String,
}

#[derive(Debug, Default)]
pub struct StudentRoster {
    students: HashMap<String, StudentInfo>,
}

impl StudentRoster {
    /// Loads the roster from `school_names.csv` in the names directory.
    /// A missing file yields an empty roster.
    pub fn load(names_dir: &Path) -> Result<Self, RosterError> {
        let school_file = names_dir.join(SCHOOL_NAMES_FILE);
        if !school_file.exists() {
            return Ok(Self::default());
        }

        let mut students = HashMap::new();
        for record in read_school_records(&school_file)? {
            let first = record.first_name.as_deref().unwrap_or("").trim();
            let last = record.last_name.as_deref().unwrap_or("").trim();
            if first.is_empty() || last.is_empty() {
                continue;
            }

            let full_name = format!("{} {}", first, last);
            let info = StudentInfo {
                id: record
                    .id
                    .as_deref()
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0),
                first_name: first.to_string(),
                last_name: last.to_string(),
                full_name: full_name.clone(),
                grade: record.grade.unwrap_or_default().trim().to_string(),
                email: record.email.unwrap_or_default().trim().to_string(),
            };
            students.insert(normalize_name(&full_name), info);
        }

        log::info!("Loaded student roster: {} students", students.len());
        Ok(Self { students })
    }

    pub fn get(&self, student_name: &str) -> Option<&StudentInfo> {
        self.students.get(&normalize_name(student_name))
    }

    /// Email lookup by full name; `None` when the student is unknown or
    /// has no address on file.
    pub fn email_for(&self, student_name: &str) -> Option<&str> {
        self.get(student_name)
            .map(|info| info.email.as_str())
            .filter(|email| !email.is_empty())
    }

    /// Roster entries whose normalized name contains the query (or vice
    /// versa). Used to offer corrections for OCR-mangled names.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<&StudentInfo> {
        let normalized = normalize_name(query);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&StudentInfo> = self
            .students
            .iter()
            .filter(|(name, _)| name.contains(&normalized) || normalized.contains(name.as_str()))
            .map(|(_, info)| info)
            .collect();
        matches.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        matches.truncate(limit);
        matches
    }

    pub fn students_with_emails(&self) -> impl Iterator<Item = &StudentInfo> {
        self.students.values().filter(|info| !info.email.is_empty())
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn roster_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let mut f = std::fs::File::create(dir.path().join(SCHOOL_NAMES_FILE)).unwrap();
        f.write_all(
            b"id,first_name,last_name,grade,email\n\
              1,Ann,Lee,10,ann.lee@school.test\n\
              2,Bo,Kim,11,\n\
              3,Ann,Leeson,10,ann.leeson@school.test\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dir = roster_dir();
        let roster = StudentRoster::load(dir.path()).unwrap();

        let info = roster.get("ANN  lee").unwrap();
        assert_eq!(info.full_name, "Ann Lee");
        assert_eq!(info.grade, "10");
        assert_eq!(info.id, 1);
    }

    #[test]
    fn test_email_lookup() {
        let dir = roster_dir();
        let roster = StudentRoster::load(dir.path()).unwrap();

        assert_eq!(roster.email_for("Ann Lee"), Some("ann.lee@school.test"));
        // Known student, no address on file.
        assert_eq!(roster.email_for("Bo Kim"), None);
        assert_eq!(roster.email_for("Nobody Here"), None);
    }

    #[test]
    fn test_suggestions_substring_match() {
        let dir = roster_dir();
        let roster = StudentRoster::load(dir.path()).unwrap();

        let matches = roster.suggestions("ann lee", 5);
        let names: Vec<_> = matches.iter().map(|i| i.full_name.as_str()).collect();
        assert_eq!(names, vec!["Ann Lee", "Ann Leeson"]);
    }

    #[test]
    fn test_suggestions_respect_limit() {
        let dir = roster_dir();
        let roster = StudentRoster::load(dir.path()).unwrap();

        assert_eq!(roster.suggestions("ann lee", 1).len(), 1);
        assert!(roster.suggestions("", 5).is_empty());
    }

    #[test]
    fn test_students_with_emails() {
        let dir = roster_dir();
        let roster = StudentRoster::load(dir.path()).unwrap();

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.students_with_emails().count(), 2);
    }

    #[test]
    fn test_missing_file_gives_empty_roster() {
        let dir = TempDir::new().unwrap();
        let roster = StudentRoster::load(dir.path()).unwrap();
        assert!(roster.is_empty());
    }
}
