//! Teaching-matrix reconciliation.
//!
//! The reconciler walks an existing teaching matrix row by row, derives each
//! row's course signature, and pulls in matching data from the normalized
//! survey or the aggregated registrar offerings. Both entry points mutate
//! the matrix passed to them in place; that is the contract, and the
//! `apply_*` names are meant to say so. Candidates are searched in source
//! order and the first match wins, so reordering an input file can change
//! which of two same-prefix candidates is chosen.

mod signature;

pub use signature::CourseSignature;

use crate::names::respondent_surname;
use crate::registrar::CourseOffering;
use crate::survey::{PreferenceTag, SurveyTable};
use crate::table::{Table, TableError};
use tracing::debug;

/// Counters describing one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub matched: usize,
    pub skipped_missing_course: usize,
    pub skipped_no_match: usize,
    pub skipped_no_data: usize,
}

/// Merges survey preferences into the matrix, in place.
///
/// For every matrix row with a matching survey column, each preference tag's
/// cell receives the semicolon-joined, deduplicated surnames of the
/// respondents who selected that preference.
pub fn apply_survey(matrix: &mut Table, survey: &SurveyTable) -> Result<ReconcileOutcome, TableError> {
    let course_column = matrix.require_column("Course")?;
    let survey_table = survey.table();
    let name_column = survey_table.require_column("Name")?;

    // preference columns are addressed per row below; create them up front
    let tag_columns: Vec<usize> = PreferenceTag::ALL
        .iter()
        .map(|tag| matrix.ensure_column(tag.label()))
        .collect();

    let mut outcome = ReconcileOutcome::default();

    for row in 0..matrix.len() {
        let label = matrix.cell(row, course_column);
        if label.trim().is_empty() {
            debug!(row, "matrix row has no course label; skipping");
            outcome.skipped_missing_course += 1;
            continue;
        }
        let target = CourseSignature::parse(label);

        let survey_column = survey_table
            .columns()
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != name_column)
            .find(|(_, name)| target.matches(&CourseSignature::parse(name)))
            .map(|(index, _)| index);

        let survey_column = match survey_column {
            Some(column) => column,
            None => {
                debug!(course = %label, "no survey column matches; skipping");
                outcome.skipped_no_match += 1;
                continue;
            }
        };

        if survey_table.column_is_empty(survey_column) {
            debug!(course = %label, "matched survey column holds no preferences");
            outcome.skipped_no_data += 1;
            continue;
        }

        for (tag, &tag_column) in PreferenceTag::ALL.iter().zip(&tag_columns) {
            let names = collect_respondents(survey_table, survey_column, name_column, *tag);
            matrix.set_cell(row, tag_column, names.join("; "));
        }
        outcome.matched += 1;
    }

    Ok(outcome)
}

/// Distinct canonical surnames of respondents whose cell carries `tag`,
/// in response order. Deduplication happens after canonicalization so two
/// spellings of one surname collapse to a single entry.
fn collect_respondents(
    survey: &Table,
    course_column: usize,
    name_column: usize,
    tag: PreferenceTag,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in 0..survey.len() {
        if !survey.cell(row, course_column).contains(tag.label()) {
            continue;
        }
        let surname = respondent_surname(survey.cell(row, name_column));
        if !surname.is_empty() && !names.contains(&surname) {
            names.push(surname);
        }
    }
    names
}

/// Merges registrar enrollment and instructor data into the matrix, in
/// place. Each matched offering writes its academic year's "\<AY\> enroll"
/// and "\<AY\> Instructor(s)" columns; offerings whose term/year never
/// parsed carry no year and are not considered.
pub fn apply_registrar(
    matrix: &mut Table,
    offerings: &[CourseOffering],
) -> Result<ReconcileOutcome, TableError> {
    let course_column = matrix.require_column("Course")?;
    let mut outcome = ReconcileOutcome::default();

    for row in 0..matrix.len() {
        let label = matrix.cell(row, course_column);
        if label.trim().is_empty() {
            debug!(row, "matrix row has no course label; skipping");
            outcome.skipped_missing_course += 1;
            continue;
        }
        let target = CourseSignature::parse(label);

        let found = offerings.iter().find(|offering| {
            offering.academic_year.is_some()
                && target.matches(&CourseSignature::parse(&offering.course))
        });

        let offering = match found {
            Some(offering) => offering,
            None => {
                debug!(course = %label, "no registrar offering matches; skipping");
                outcome.skipped_no_match += 1;
                continue;
            }
        };
        let year = match offering.academic_year.as_deref() {
            Some(year) => year.to_string(),
            None => continue,
        };

        let enroll_column = matrix.ensure_column(&format!("{} enroll", year));
        let instructor_column = matrix.ensure_column(&format!("{} Instructor(s)", year));
        matrix.set_cell(row, enroll_column, offering.enrollment.to_string());
        matrix.set_cell(row, instructor_column, offering.instructor_list());
        outcome.matched += 1;
    }

    Ok(outcome)
}
