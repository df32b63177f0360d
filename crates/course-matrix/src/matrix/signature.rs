//! Course signature derivation and matching.
//!
//! "BE 105", "BE 0105abc", and "BE 105 abc (9 units)" all refer to the same
//! offering family. A signature splits a label into a prefix (subject plus
//! number, leading zeros stripped) and a suffix of section letters so the
//! variants can be aligned.

use regex::Regex;
use std::sync::OnceLock;

fn prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\S*) 0*([1-9][0-9X]*)").expect("prefix pattern compiles")
    })
}

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\S* [0-9X]+([a-dA-D]+)").expect("suffix pattern compiles")
    })
}

/// Derived matching key for a course label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSignature {
    /// Subject code plus course number, leading zeros stripped.
    pub prefix: String,
    /// Trailing section letters, possibly empty.
    pub suffix: String,
}

impl CourseSignature {
    /// Derives the signature of a label. Labels that do not look like a
    /// course code keep their raw text as the prefix, which simply never
    /// matches a real candidate.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        let prefix = match prefix_pattern().captures(trimmed) {
            Some(caps) => format!("{} {}", &caps[1], &caps[2]),
            None => trimmed.to_string(),
        };
        let suffix = suffix_pattern()
            .captures(trimmed)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        Self { prefix, suffix }
    }

    /// True when `candidate` names the same offering family as `self`.
    ///
    /// Prefixes must be equal; a non-empty query suffix must additionally be
    /// contained in the candidate's suffix, so a matrix row abbreviating a
    /// multi-term offering ("105ab") still matches a candidate labeled
    /// "105abc".
    pub fn matches(&self, candidate: &CourseSignature) -> bool {
        if self.prefix != candidate.prefix {
            return false;
        }
        self.suffix.is_empty() || candidate.suffix.contains(&self.suffix)
    }
}
