//! CSV loading for the name registry.
//!
//! Two files are recognized in the names directory:
//! - `school_names.csv` — `id, first_name, last_name, grade, email` rows;
//!   first and last names feed the scrub set, "first last" the full-name set.
//! - `common_names.csv` — single `name` column of additional scrub tokens.
//!
//! A missing file is skipped; an empty registry is legal (the scrubber
//! treats it as a pass-through).

use std::path::Path;

use serde::Deserialize;

use crate::error::RosterError;
use crate::roster::registry::NameRegistry;

pub const SCHOOL_NAMES_FILE: &str = "school_names.csv";
pub const COMMON_NAMES_FILE: &str = "common_names.csv";

#[derive(Debug, Deserialize)]
pub(crate) struct SchoolRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommonRecord {
    #[serde(default)]
    name: Option<String>,
}

/// Loads all known names from the directory into a registry.
pub fn load_registry(names_dir: &Path, min_length: usize) -> Result<NameRegistry, RosterError> {
    let mut registry = NameRegistry::new(min_length);

    let school_file = names_dir.join(SCHOOL_NAMES_FILE);
    if school_file.exists() {
        for record in read_school_records(&school_file)? {
            if let Some(first) = record.first_name.as_deref() {
                registry.add_scrub_token(first);
            }
            if let Some(last) = record.last_name.as_deref() {
                registry.add_scrub_token(last);
            }
            if let (Some(first), Some(last)) =
                (record.first_name.as_deref(), record.last_name.as_deref())
            {
                registry.add_full_name(&format!("{} {}", first.trim(), last.trim()));
            }
        }
    }

    let common_file = names_dir.join(COMMON_NAMES_FILE);
    if common_file.exists() {
        let mut reader =
            csv::Reader::from_path(&common_file).map_err(|e| RosterError::Parse {
                path: common_file.clone(),
                source: e,
            })?;
        for result in reader.deserialize::<CommonRecord>() {
            let record = result.map_err(|e| RosterError::Parse {
                path: common_file.clone(),
                source: e,
            })?;
            if let Some(name) = record.name.as_deref() {
                registry.add_scrub_token(name);
            }
        }
    }

    log::info!(
        "Loaded name registry from {}: {} scrub tokens",
        names_dir.display(),
        registry.token_count()
    );

    Ok(registry)
}

pub(crate) fn read_school_records(path: &Path) -> Result<Vec<SchoolRecord>, RosterError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| RosterError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();
    for result in reader.deserialize::<SchoolRecord>() {
        records.push(result.map_err(|e| RosterError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_school_names() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            SCHOOL_NAMES_FILE,
            "id,first_name,last_name,grade,email\n\
             1,Ann,Lee,10,ann.lee@school.test\n\
             2,Bo,Kim,10,\n",
        );

        let registry = load_registry(dir.path(), 2).unwrap();
        assert_eq!(registry.token_count(), 4);
        assert!(registry.contains_full_name("ann lee"));
        assert!(registry.contains_full_name("bo kim"));
    }

    #[test]
    fn test_load_common_names() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), COMMON_NAMES_FILE, "name\nJordan\nRiver\n");

        let registry = load_registry(dir.path(), 2).unwrap();
        assert_eq!(registry.token_count(), 2);
        assert!(!registry.contains_full_name("jordan"));
    }

    #[test]
    fn test_both_files_merge() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            SCHOOL_NAMES_FILE,
            "id,first_name,last_name,grade,email\n1,Ann,Lee,10,a@b.test\n",
        );
        write_file(dir.path(), COMMON_NAMES_FILE, "name\nJordan\n");

        let registry = load_registry(dir.path(), 2).unwrap();
        assert_eq!(registry.token_count(), 3);
    }

    #[test]
    fn test_missing_files_give_empty_registry() {
        let dir = TempDir::new().unwrap();
        let registry = load_registry(dir.path(), 2).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_min_length_applied_to_csv_names() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), COMMON_NAMES_FILE, "name\nJo\nA\n");

        let registry = load_registry(dir.path(), 2).unwrap();
        assert_eq!(registry.token_count(), 1);
    }
}
