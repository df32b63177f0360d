//! Registrar export import.
//!
//! The registrar exports one row per (offering, section, instructor), so a
//! course taught by three co-instructors across two sections arrives as a
//! run of consecutive rows. The importer collapses each run into one
//! [`CourseOffering`], counting enrollment once per distinct section and
//! co-instructors not at all.

use crate::names::normalize_name;
use crate::table::{Table, TableError};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Academic term codes used by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Fall,
    Winter,
    Spring,
    Summer,
}

impl Term {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FA" => Some(Self::Fall),
            "WI" => Some(Self::Winter),
            "SP" => Some(Self::Spring),
            "SU" => Some(Self::Summer),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Fall => "FA",
            Self::Winter => "WI",
            Self::Spring => "SP",
            Self::Summer => "SU",
        }
    }
}

/// One course offering in one term, aggregated over its sections and
/// co-instructors.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseOffering {
    pub course: String,
    pub title: String,
    pub sections: u32,
    /// Canonical instructor names in first-seen order, deduplicated.
    pub instructors: Vec<String>,
    /// "Research" for research offerings, empty otherwise.
    pub course_type: String,
    pub academic_year: Option<String>,
    pub term: Option<Term>,
    /// Counted once per distinct section, never per co-instructor.
    pub enrollment: u32,
    pub division: String,
}

impl CourseOffering {
    pub fn instructor_list(&self) -> String {
        self.instructors.join("; ")
    }
}

/// One raw row of the registrar export.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrarRow {
    #[serde(rename = "OFFERING_NAME")]
    pub offering_name: String,
    #[serde(rename = "OFFERING_TITLE", default)]
    pub offering_title: String,
    #[serde(rename = "SECTION", default)]
    pub section: String,
    #[serde(rename = "INSTRUCTOR", default)]
    pub instructor: String,
    #[serde(rename = "NUM_ENROLLED", default)]
    pub num_enrolled: String,
    #[serde(rename = "TERM_NAME", default)]
    pub term_name: String,
    #[serde(rename = "Research", default)]
    pub research: String,
    #[serde(rename = "DEPARTMENT_NAME", default)]
    pub department: String,
    #[serde(rename = "DIVISION", default)]
    pub division: String,
}

impl RegistrarRow {
    fn enrolled(&self) -> u32 {
        let raw = self.num_enrolled.trim();
        if raw.is_empty() {
            return 0;
        }
        match raw.parse::<f64>() {
            Ok(value) if value >= 0.0 => value as u32,
            _ => {
                warn!(
                    offering = %self.offering_name,
                    enrolled = %self.num_enrolled,
                    "could not parse enrollment count; treating as zero"
                );
                0
            }
        }
    }
}

#[derive(Debug)]
pub enum ImportError {
    Csv(csv::Error),
    Table(TableError),
    SubjectPattern(regex::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Csv(err) => write!(f, "invalid registrar CSV data: {}", err),
            ImportError::Table(err) => write!(f, "could not read registrar table: {}", err),
            ImportError::SubjectPattern(err) => {
                write!(f, "subject allowlist does not form a valid pattern: {}", err)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Csv(err) => Some(err),
            ImportError::Table(err) => Some(err),
            ImportError::SubjectPattern(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<TableError> for ImportError {
    fn from(err: TableError) -> Self {
        Self::Table(err)
    }
}

/// Controls which offerings are imported and how instructors are rendered.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Subject prefixes retained by the offering-name filter.
    pub subjects: Vec<String>,
    /// Keep only the last-name component of instructor names.
    pub last_name_only: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            subjects: ["BE", "Bi", "BMB", "CNS", "NB"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            last_name_only: false,
        }
    }
}

fn term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(FA|WI|SP|SU)\s*([0-9]+-[0-9]+)").expect("term pattern compiles")
    })
}

fn course_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([^0-9\s]+)\s*([0-9]+)\s*([a-zA-Z]*)").expect("course pattern compiles")
    })
}

/// Parses registrar CSV rows in the export's column layout.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<RegistrarRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<RegistrarRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Adapts an already-loaded [`Table`] (e.g. a workbook sheet) to registrar
/// rows. Only OFFERING_NAME is required; other columns default to empty.
pub fn rows_from_table(table: &Table) -> Result<Vec<RegistrarRow>, ImportError> {
    let offering_name = table.require_column("OFFERING_NAME").map_err(ImportError::Table)?;
    let column = |name: &str| table.column_index(name);
    let (title, section, instructor, enrolled, term, research, department, division) = (
        column("OFFERING_TITLE"),
        column("SECTION"),
        column("INSTRUCTOR"),
        column("NUM_ENROLLED"),
        column("TERM_NAME"),
        column("Research"),
        column("DEPARTMENT_NAME"),
        column("DIVISION"),
    );

    let cell = |row: usize, index: Option<usize>| {
        index.map(|i| table.cell(row, i).to_string()).unwrap_or_default()
    };

    Ok((0..table.len())
        .map(|row| RegistrarRow {
            offering_name: table.cell(row, offering_name).to_string(),
            offering_title: cell(row, title),
            section: cell(row, section),
            instructor: cell(row, instructor),
            num_enrolled: cell(row, enrolled),
            term_name: cell(row, term),
            research: cell(row, research),
            department: cell(row, department),
            division: cell(row, division),
        })
        .collect())
}

/// Collapses per-instructor registrar rows into aggregated offerings.
///
/// Rows sharing an offering name form a run; within a run, a change of
/// section id adds that section's enrollment while an unchanged section id
/// marks a co-instructor whose enrollment is already counted. Section
/// comparison is against the previous row only, so a section revisited
/// non-contiguously would be recounted; registrar exports keep sections
/// contiguous.
pub fn import_offerings<I>(rows: I, options: &ImportOptions) -> Result<Vec<CourseOffering>, ImportError>
where
    I: IntoIterator<Item = RegistrarRow>,
{
    let subject_filter = Regex::new(&format!(".*({}).*", options.subjects.join("|")))
        .map_err(ImportError::SubjectPattern)?;

    let mut offerings: Vec<CourseOffering> = Vec::new();
    let mut current_label: Option<String> = None;
    let mut current_section = String::new();

    for row in rows {
        if !subject_filter.is_match(&row.offering_name) {
            continue;
        }

        let instructor = normalize_name(&row.instructor, options.last_name_only);
        let is_continuation = current_label.as_deref() == Some(row.offering_name.as_str());

        if is_continuation {
            // a continuation row always follows an appended offering
            let offering = match offerings.last_mut() {
                Some(offering) => offering,
                None => continue,
            };

            if offering.instructors.is_empty() {
                warn!(
                    offering = %row.offering_name,
                    "continuation row for an offering with no prior instructor"
                );
            }
            if !instructor.is_empty() && !offering.instructors.contains(&instructor) {
                offering.instructors.push(instructor);
            }

            if row.section != current_section {
                // a new section of the same offering
                offering.enrollment += row.enrolled();
                offering.sections += 1;
                current_section = row.section.clone();
                debug!(offering = %row.offering_name, section = %row.section, "new section");
            } else {
                // co-instructor of an already-counted section
                debug!(offering = %row.offering_name, "co-instructor");
            }
        } else {
            let (term, academic_year) = parse_term_year(&row.offering_name, &row.term_name);
            let course = parse_course_code(&row.offering_name);
            let instructors = if instructor.is_empty() {
                Vec::new()
            } else {
                vec![instructor]
            };

            debug!(course = %course, term = ?term, "found offering");
            offerings.push(CourseOffering {
                course,
                title: row.offering_title.clone(),
                sections: 1,
                instructors,
                course_type: if row.research == "Y" {
                    "Research".to_string()
                } else {
                    String::new()
                },
                academic_year,
                term,
                enrollment: row.enrolled(),
                division: row.division.replace("Bi", "BBE"),
            });

            current_label = Some(row.offering_name.clone());
            current_section = row.section.clone();
        }
    }

    Ok(offerings)
}

fn parse_term_year(label: &str, term_name: &str) -> (Option<Term>, Option<String>) {
    match term_pattern().captures(term_name) {
        Some(caps) => (Term::from_code(&caps[1]), Some(caps[2].to_string())),
        None => {
            warn!(offering = %label, term = %term_name, "could not parse term/year");
            (None, None)
        }
    }
}

/// Normalizes an offering label like "Bi 008a" to "Bi 8a"; an unparseable
/// label falls back to the raw text.
fn parse_course_code(label: &str) -> String {
    match course_code_pattern().captures(label) {
        Some(caps) => {
            let number: u64 = caps[2].parse().unwrap_or(0);
            format!("{} {}{}", &caps[1], number, &caps[3])
        }
        None => {
            warn!(offering = %label, "could not parse course code; keeping raw label");
            label.to_string()
        }
    }
}
