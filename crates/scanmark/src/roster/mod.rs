//! Known-name handling: the scrub registry and the student roster.
//!
//! Both are loaded once from CSV files in the names directory and are
//! read-only afterward. The registry feeds name detection and scrubbing;
//! the roster adds per-student records (grade, email) for downstream
//! delivery steps.

pub mod loader;
pub mod registry;
pub mod students;

pub use loader::load_registry;
pub use registry::{normalize_name, NameRegistry};
pub use students::{StudentInfo, StudentRoster};
