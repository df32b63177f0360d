//! Faculty roster loading.
//!
//! The faculty workbook keeps tenure-track and non-tenure-track faculty on
//! separate sheets with slightly different columns. Both flatten to
//! [`FacultyRecord`]s with a canonical name and a rank. Affiliated faculty
//! have no rank source at all, so asking for them is a hard error rather
//! than a silently empty result.

use crate::names::create_name;
use crate::table::{Table, TableError};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

pub const TENURE_TRACK_SHEET: &str = "Tenure Track";
pub const NON_TENURE_TRACK_SHEET: &str = "Non-Tenure track";

/// One faculty member with a canonical "Last, First" name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyRecord {
    pub name: String,
    pub rank: String,
}

#[derive(Debug)]
pub enum FacultyError {
    Table(TableError),
    /// Affiliated-faculty loading has no data source yet.
    Unsupported(&'static str),
}

impl fmt::Display for FacultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacultyError::Table(err) => write!(f, "could not read faculty workbook: {}", err),
            FacultyError::Unsupported(what) => write!(f, "{} is not supported", what),
        }
    }
}

impl std::error::Error for FacultyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FacultyError::Table(err) => Some(err),
            FacultyError::Unsupported(_) => None,
        }
    }
}

impl From<TableError> for FacultyError {
    fn from(err: TableError) -> Self {
        Self::Table(err)
    }
}

fn professor_title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(.* Professor).*").expect("title pattern compiles"))
}

/// Loads and flattens the faculty workbook.
///
/// `include_affiliated` fails fast: there is no recovery path, and a silent
/// partial roster would be worse than an error.
pub fn load_workbook<P: AsRef<Path>>(
    path: P,
    include_affiliated: bool,
) -> Result<Vec<FacultyRecord>, FacultyError> {
    if include_affiliated {
        return Err(FacultyError::Unsupported("affiliated faculty loading"));
    }

    let path = path.as_ref();
    let tenure = Table::load_path(path, Some(TENURE_TRACK_SHEET), 0)?;
    let non_tenure = Table::load_path(path, Some(NON_TENURE_TRACK_SHEET), 0)?;
    Ok(from_sheets(&tenure, &non_tenure))
}

/// Flattens the two roster sheets. Rows missing a first or last name are
/// dropped.
pub fn from_sheets(tenure: &Table, non_tenure: &Table) -> Vec<FacultyRecord> {
    let mut records = Vec::new();

    for row in 0..tenure.len() {
        let Some(name) = row_name(tenure, row) else {
            continue;
        };
        let tenured = tenure
            .get(row, "Tenure date")
            .map(|date| !date.trim().is_empty())
            .unwrap_or(false);
        let rank = if tenured {
            "Professor".to_string()
        } else {
            "Assistant Professor".to_string()
        };
        records.push(FacultyRecord { name, rank });
    }

    for row in 0..non_tenure.len() {
        let Some(name) = row_name(non_tenure, row) else {
            continue;
        };
        let title = non_tenure.get(row, "Functional Job Title").unwrap_or("");
        let rank = professor_title_pattern()
            .replace(title, "${1}")
            .into_owned();
        records.push(FacultyRecord { name, rank });
    }

    debug!(count = records.len(), "flattened faculty roster");
    records
}

fn row_name(table: &Table, row: usize) -> Option<String> {
    let last = table.get(row, "Last Name").unwrap_or("").trim();
    let first = table.get(row, "First Name").unwrap_or("").trim();
    if last.is_empty() || first.is_empty() {
        return None;
    }
    Some(create_name(last, first))
}
