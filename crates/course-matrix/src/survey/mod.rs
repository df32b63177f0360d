//! Teaching-interest survey normalization.
//!
//! Survey exports label each course column with the full question text plus
//! a bracketed course code, and each answer cell with a full sentence. Both
//! are rewritten here so the reconciler can match on bare course codes and
//! short preference tags.

use crate::table::Table;
use regex::Regex;
use std::sync::OnceLock;

/// The five teaching-interest categories a respondent can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceTag {
    Next,
    Future,
    Help,
    Change,
    Again,
}

impl PreferenceTag {
    pub const ALL: [PreferenceTag; 5] = [
        PreferenceTag::Next,
        PreferenceTag::Future,
        PreferenceTag::Help,
        PreferenceTag::Change,
        PreferenceTag::Again,
    ];

    /// Short tag written into survey cells and used as a matrix column name.
    pub fn label(&self) -> &'static str {
        match self {
            PreferenceTag::Next => "Next",
            PreferenceTag::Future => "Future",
            PreferenceTag::Help => "Help",
            PreferenceTag::Change => "Change",
            PreferenceTag::Again => "Again",
        }
    }
}

fn column_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r".* \[([^-]+) - .*\]").expect("column code pattern compiles")
    })
}

fn sentence_rules() -> &'static Vec<(Regex, PreferenceTag)> {
    static RULES: OnceLock<Vec<(Regex, PreferenceTag)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (
                r"Would like to teach this course next year",
                PreferenceTag::Next,
            ),
            (
                r"Interested in teaching this course at some point",
                PreferenceTag::Future,
            ),
            (
                r"Have some expertise .* willing to share",
                PreferenceTag::Help,
            ),
            (
                r"Currently teaching, .* would like to teach other courses",
                PreferenceTag::Change,
            ),
            (
                r"Have taught in the past, would like to teach again",
                PreferenceTag::Again,
            ),
        ]
        .into_iter()
        .map(|(pattern, tag)| {
            (
                Regex::new(pattern).expect("sentence pattern compiles"),
                tag,
            )
        })
        .collect()
    })
}

/// A survey export with course-code column names and tagged answer cells.
#[derive(Debug, Clone)]
pub struct SurveyTable {
    table: Table,
}

impl SurveyTable {
    /// Normalizes a raw survey table: columns embedding "[CODE - ...]" are
    /// renamed to the bare code, and answer sentences are rewritten to
    /// preference tags. Cells that match no known sentence are untouched.
    pub fn from_table(mut table: Table) -> Self {
        let renames: Vec<(usize, String)> = table
            .columns()
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                column_code_pattern()
                    .captures(name)
                    .map(|caps| (index, caps[1].trim().to_string()))
            })
            .collect();
        for (index, code) in renames {
            table.rename_column(index, code);
        }

        let rules = sentence_rules();
        let width = table.columns().len();
        for row in 0..table.len() {
            for column in 0..width {
                let cell = table.cell(row, column);
                if cell.is_empty() {
                    continue;
                }
                let mut value = cell.to_string();
                let mut changed = false;
                for (pattern, tag) in rules {
                    if pattern.is_match(&value) {
                        value = pattern.replace_all(&value, tag.label()).into_owned();
                        changed = true;
                    }
                }
                if changed {
                    table.set_cell(row, column, value);
                }
            }
        }

        Self { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}
