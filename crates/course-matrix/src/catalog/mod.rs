//! Catalog page parsing.
//!
//! Each course on a catalog page sits inside a `<div>` whose class is the
//! course-block marker, with `<span>` children carrying the individual
//! fields. The parser is a small state machine over the markup event stream;
//! a record is only emitted when its opening `<div>` is properly closed, so
//! truncated pages cannot inflate the course count.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Class attribute that opens a course block (compared after trimming).
const COURSE_BLOCK_MARKER: &str = "course-description";

/// One course as it appears on a catalog page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Course")]
    pub course: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Units")]
    pub units: String,
    #[serde(rename = "Terms")]
    pub terms_offered: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Prerequisites")]
    pub prerequisites: String,
    #[serde(rename = "Instructors")]
    pub instructors: String,
}

/// The span classes we recognize inside a course block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogField {
    Label,
    Title,
    Units,
    Terms,
    Prerequisites,
    Description,
    Instructors,
}

impl CatalogField {
    fn from_class(class: &str) -> Option<Self> {
        match class {
            "course-description__label" => Some(Self::Label),
            "course-description__title" => Some(Self::Title),
            "course-description__units" => Some(Self::Units),
            "course-description__terms" => Some(Self::Terms),
            "course-description__prerequisites" => Some(Self::Prerequisites),
            "course-description__description" => Some(Self::Description),
            "course-description__instructors" => Some(Self::Instructors),
            _ => None,
        }
    }
}

/// Parser states. A field can only be active inside a course block, which
/// the variant shape enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Outside,
    InCourseBlock,
    InField(CatalogField),
}

/// Streaming state machine that turns catalog markup into [`CourseRecord`]s.
#[derive(Debug)]
pub struct CatalogParser {
    state: ParserState,
    /// Depth of `<div>` nesting inside the open course block.
    div_depth: usize,
    /// Depth of `<span>` nesting inside the open field.
    span_depth: usize,
    current: Option<CourseRecord>,
    records: Vec<CourseRecord>,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Outside,
            div_depth: 0,
            span_depth: 0,
            current: None,
            records: Vec::new(),
        }
    }

    /// Parses a whole catalog page and returns the completed records in
    /// document order. Markup errors and unterminated blocks degrade to
    /// warnings; they never abort the page.
    pub fn parse(page: &str) -> Vec<CourseRecord> {
        let mut parser = Self::new();
        let mut reader = Reader::from_str(page);
        reader.config_mut().trim_text(true);
        reader.config_mut().check_end_names = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => parser.handle_start(e),
                Ok(Event::End(ref e)) => parser.handle_end(e.name().as_ref()),
                Ok(Event::Text(ref e)) => {
                    parser.handle_text(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    warn!(%err, "stopping catalog parse on malformed markup");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        parser.finish()
    }

    fn handle_start(&mut self, tag: &BytesStart<'_>) {
        let name = tag.name().as_ref().to_ascii_lowercase();
        match name.as_slice() {
            b"div" => {
                if self.current.is_some() {
                    self.div_depth += 1;
                } else if attribute(tag, b"class")
                    .map(|class| class.trim() == COURSE_BLOCK_MARKER)
                    .unwrap_or(false)
                {
                    let id = attribute(tag, b"id").unwrap_or_default();
                    self.current = Some(CourseRecord {
                        id,
                        ..CourseRecord::default()
                    });
                    self.state = ParserState::InCourseBlock;
                    self.div_depth = 0;
                }
            }
            b"span" => match self.state {
                ParserState::InCourseBlock => {
                    if let Some(field) = attribute(tag, b"class")
                        .as_deref()
                        .and_then(CatalogField::from_class)
                    {
                        self.state = ParserState::InField(field);
                        self.span_depth = 0;
                    }
                }
                ParserState::InField(_) => self.span_depth += 1,
                ParserState::Outside => {}
            },
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name.to_ascii_lowercase().as_slice() {
            b"span" => {
                if let ParserState::InField(_) = self.state {
                    if self.span_depth > 0 {
                        self.span_depth -= 1;
                    } else {
                        self.state = ParserState::InCourseBlock;
                    }
                }
            }
            b"div" => {
                if self.current.is_some() {
                    if self.div_depth > 0 {
                        self.div_depth -= 1;
                    } else {
                        self.close_block();
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        let field = match self.state {
            ParserState::InField(field) => field,
            _ => return,
        };
        let record = match self.current.as_mut() {
            Some(record) => record,
            None => return,
        };
        let slot = match field {
            CatalogField::Label => &mut record.course,
            CatalogField::Title => &mut record.title,
            CatalogField::Units => &mut record.units,
            CatalogField::Terms => &mut record.terms_offered,
            CatalogField::Prerequisites => &mut record.prerequisites,
            CatalogField::Description => &mut record.description,
            CatalogField::Instructors => &mut record.instructors,
        };
        // fields can span several text chunks split by inline markup
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    fn close_block(&mut self) {
        if let Some(mut record) = self.current.take() {
            postprocess(&mut record);
            debug!(course = %record.course, id = %record.id, "parsed catalog entry");
            self.records.push(record);
        }
        self.state = ParserState::Outside;
        self.div_depth = 0;
        self.span_depth = 0;
    }

    fn finish(mut self) -> Vec<CourseRecord> {
        if let Some(record) = self.current.take() {
            warn!(
                id = %record.id,
                "dropping unterminated course block at end of page"
            );
        }
        self.records
    }
}

fn attribute(tag: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn prerequisite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:BE|Bi|BMB|CNS|NB)[^ ]*\s[0-9]+\s*[abcdx]*")
            .expect("prerequisite pattern compiles")
    })
}

fn postprocess(record: &mut CourseRecord) {
    let junk = |c: char| c == ' ' || c == '.';
    record.title = record.title.trim_matches(junk).to_string();
    record.prerequisites = record.prerequisites.trim_matches(junk).to_string();

    if !record.prerequisites.is_empty() {
        // keep only recognizable course codes, compacted to "BE105a" form
        let codes: Vec<String> = prerequisite_pattern()
            .find_iter(&record.prerequisites)
            .map(|m| m.as_str().split_whitespace().collect::<String>())
            .collect();
        record.prerequisites = codes.join(", ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BLOCK_PAGE: &str = r#"
        <html><body>
        <div class="course-description " id="be-105">
          <span class="course-description__label">BE 105 abc</span>
          <span class="course-description__title">Intro to X.</span>
          <span class="course-description__units">9 units</span>
          <span class="course-description__terms">first, second terms</span>
          <span class="course-description__prerequisites">Prerequisites: BE 105 a, Bi 101</span>
          <span class="course-description__description">Broad survey of X.</span>
          <span class="course-description__instructors">Phillips</span>
        </div>
        <div class="course-description" id="bi-9">
          <span class="course-description__label">Bi 9</span>
          <span class="course-description__title">Cell Biology</span>
        </div>
        </body></html>
    "#;

    #[test]
    fn parses_blocks_in_document_order() {
        let records = CatalogParser::parse(TWO_BLOCK_PAGE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "be-105");
        assert_eq!(records[0].course, "BE 105 abc");
        assert_eq!(records[1].id, "bi-9");
        assert_eq!(records[1].title, "Cell Biology");
    }

    #[test]
    fn strips_trailing_periods_and_compacts_prerequisites() {
        let records = CatalogParser::parse(TWO_BLOCK_PAGE);
        assert_eq!(records[0].title, "Intro to X");
        assert_eq!(records[0].prerequisites, "BE105a, Bi101");
    }

    #[test]
    fn discards_non_course_prerequisite_text() {
        let page = r#"
            <div class="course-description" id="c1">
              <span class="course-description__prerequisites">instructor permission; CNS 187</span>
            </div>
        "#;
        let records = CatalogParser::parse(page);
        assert_eq!(records[0].prerequisites, "CNS187");
    }

    #[test]
    fn nested_divs_do_not_close_the_block_early() {
        let page = r#"
            <div class="course-description" id="c1">
              <div class="course-description__inner">
                <span class="course-description__title">Nested Title</span>
              </div>
              <span class="course-description__units">6 units</span>
            </div>
        "#;
        let records = CatalogParser::parse(page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Nested Title");
        assert_eq!(records[0].units, "6 units");
    }

    #[test]
    fn unterminated_block_is_not_emitted() {
        let page = r#"
            <div class="course-description" id="done">
              <span class="course-description__title">Complete</span>
            </div>
            <div class="course-description" id="truncated">
              <span class="course-description__title">Partial</span>
        "#;
        let records = CatalogParser::parse(page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "done");
    }

    #[test]
    fn field_text_split_by_inline_markup_is_concatenated() {
        let page = r#"
            <div class="course-description" id="c1">
              <span class="course-description__description">Part one <b>and</b> part two</span>
            </div>
        "#;
        let records = CatalogParser::parse(page);
        assert_eq!(records[0].description, "Part one and part two");
    }

    #[test]
    fn spans_outside_course_blocks_are_ignored() {
        let page = r#"
            <span class="course-description__title">Stray</span>
            <div class="course-description" id="c1">
              <span class="course-description__title">Real</span>
            </div>
        "#;
        let records = CatalogParser::parse(page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Real");
    }
}
