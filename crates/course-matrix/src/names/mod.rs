//! Canonicalization of faculty and survey respondent names.
//!
//! Faculty names arrive in several shapes ("Rob Phillips", "Phillips, Robert
//! T.", registrar exports with middle initials) and every source must agree
//! on a single "Last, First" spelling before records can be merged. The
//! pipeline here is an ordered list of rewrite rules: the generic reshaping
//! rules run first and the person-specific alias table matches their output,
//! so rule order is load-bearing.

use regex::Regex;
use std::sync::OnceLock;

/// One step of a rewrite pipeline: a pattern and its replacement, applied
/// with `replace_all` over the intermediate string.
#[derive(Debug)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: &'static str,
}

impl RewriteRule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("rewrite pattern compiles"),
            replacement,
        }
    }

    fn apply(&self, input: &str) -> String {
        self.pattern.replace_all(input, self.replacement).into_owned()
    }
}

/// An ordered rewrite pipeline evaluated over immutable intermediate strings.
#[derive(Debug)]
pub struct NamePipeline {
    rules: Vec<RewriteRule>,
}

impl NamePipeline {
    fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Runs every rule in sequence and returns the final string.
    pub fn apply(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.trim().to_string(), |acc, rule| rule.apply(&acc))
    }
}

fn faculty_pipeline() -> &'static NamePipeline {
    static PIPELINE: OnceLock<NamePipeline> = OnceLock::new();
    PIPELINE.get_or_init(|| {
        NamePipeline::new(vec![
            // "First Last" -> "Last, First" (only when no comma is present)
            RewriteRule::new(r"(^[a-zA-Z]+) ([^,]+)$", "${2}, ${1}"),
            // "Last, First Middle" -> "Last, First"
            RewriteRule::new(r"([a-zA-Z \-]*), (\S+) \S+", "${1}, ${2}"),
            // Preferred-name overrides; these match the output of the rules
            // above, never the raw input.
            RewriteRule::new(r"Bronner .*, Marianne", "Bronner, Marianne"),
            RewriteRule::new(r"Campbell, Judith", "Campbell, Judy"),
            RewriteRule::new(r"Dunphy, William", "Dunphy, Bill"),
            RewriteRule::new(r"Guttman, Mitchell", "Guttman, Mitch"),
            RewriteRule::new(r"Hong, Elizabeth", "Hong, Betty"),
            RewriteRule::new(r"Mayo, Stephen", "Mayo, Steve"),
            RewriteRule::new(r"Meyerowitz, Elliott", "Meyerowitz, Elliot"),
            RewriteRule::new(r"Phillips, Robert", "Phillips, Rob"),
            RewriteRule::new(r"Shimojo, Shinsuke", "Shimojo, Shin"),
            RewriteRule::new(r"Siapas, Athanassios", "Siapas, Thanos"),
            RewriteRule::new(r"Thanos, Siapas", "Siapas, Thanos"),
            RewriteRule::new(r"Stathopoulos, Angelike", "Stathopoulos, Angela"),
            RewriteRule::new(r"Van Valen, David", "Van Valen, Dave"),
            RewriteRule::new(r"Varshavsky, Alexander", "Varshavsky, Alex"),
            RewriteRule::new(r"Zernicka-Goetz, Magdalena", "Zernicka-Goetz, Magda"),
            RewriteRule::new(r"Fejes-Toth, Katalin", "Fejes-Toth, Kata"),
            RewriteRule::new(r"Yui, Mary.*", "Yui, Mary"),
        ])
    })
}

fn last_name_rule() -> &'static RewriteRule {
    static RULE: OnceLock<RewriteRule> = OnceLock::new();
    RULE.get_or_init(|| RewriteRule::new(r"(.*), (.*)", "${1}"))
}

/// Rewrites a raw faculty name into canonical "Last, First" form.
///
/// Idempotent: feeding an already-canonical name back through returns it
/// unchanged. With `last_name_only` the first-name component is dropped
/// after the alias pipeline has run.
pub fn normalize_name(full_name: &str, last_name_only: bool) -> String {
    let canonical = faculty_pipeline().apply(full_name);
    if last_name_only {
        last_name_rule().apply(&canonical)
    } else {
        canonical
    }
}

/// Formats a (last, first) pair and runs it through the alias pipeline.
pub fn create_name(last_name: &str, first_name: &str) -> String {
    normalize_name(&format!("{}, {}", last_name, first_name), false)
}

fn respondent_pipeline() -> &'static NamePipeline {
    static PIPELINE: OnceLock<NamePipeline> = OnceLock::new();
    PIPELINE.get_or_init(|| {
        NamePipeline::new(vec![
            // drop leading given names, keeping the final token
            RewriteRule::new(r"\S+\s+(\S+)", "${1}"),
            // drop a surviving single-letter initial ("C. Smith" -> "Smith")
            RewriteRule::new(r"\S* *[A-Z]\. *(\S+)", "${1}"),
            // surnames with a "Van" particle keep it
            RewriteRule::new(r"\S* Van *(\S+)", "Van ${1}"),
        ])
    })
}

/// Canonicalizes a free-text survey respondent name down to a title-cased
/// surname.
///
/// This is deliberately separate from [`normalize_name`]: survey respondents
/// type their own names ("Rob Phillips", "R. Phillips", "David Van Valen")
/// while faculty records are structured, and the two formats need different
/// handling.
pub fn respondent_surname(full_name: &str) -> String {
    title_case(respondent_pipeline().apply(full_name).trim())
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reshapes_first_last_into_last_first() {
        assert_eq!(normalize_name("Rob Phillips", false), "Phillips, Rob");
        assert_eq!(
            normalize_name("Magdalena Zernicka-Goetz", false),
            "Zernicka-Goetz, Magda"
        );
    }

    #[test]
    fn collapses_middle_names_after_the_comma() {
        assert_eq!(
            normalize_name("Bronner, Marianne E.", false),
            "Bronner, Marianne"
        );
    }

    #[test]
    fn applies_preferred_name_overrides() {
        assert_eq!(normalize_name("Campbell, Judith", false), "Campbell, Judy");
        assert_eq!(normalize_name("Stephen Mayo", false), "Mayo, Steve");
        // reversed alias entry catches a known swapped form
        assert_eq!(normalize_name("Thanos, Siapas", false), "Siapas, Thanos");
        assert_eq!(
            normalize_name("Athanassios Siapas", false),
            "Siapas, Thanos"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "Rob Phillips",
            "Campbell, Judith",
            "Marianne Bronner",
            "David Van Valen",
            "Yui, Mary Ann",
        ] {
            let once = normalize_name(raw, false);
            assert_eq!(normalize_name(&once, false), once, "input {raw:?}");
        }
    }

    #[test]
    fn last_name_only_strips_the_first_name() {
        assert_eq!(normalize_name("Rob Phillips", true), "Phillips");
        assert_eq!(normalize_name("Van Valen, David", true), "Van Valen");
    }

    #[test]
    fn create_name_formats_then_normalizes() {
        assert_eq!(create_name("Guttman", "Mitchell"), "Guttman, Mitch");
        assert_eq!(create_name("Hong", "Elizabeth"), "Hong, Betty");
    }

    #[test]
    fn respondent_surname_keeps_last_token() {
        assert_eq!(respondent_surname("Rob Phillips"), "Phillips");
        assert_eq!(respondent_surname("R. Phillips"), "Phillips");
        assert_eq!(respondent_surname("Mary C. Smith"), "Smith");
    }

    #[test]
    fn respondent_surname_preserves_van_particle() {
        assert_eq!(respondent_surname("David Van Valen"), "Van Valen");
    }

    #[test]
    fn respondent_surname_title_cases() {
        assert_eq!(respondent_surname("rob PHILLIPS"), "Phillips");
    }
}
