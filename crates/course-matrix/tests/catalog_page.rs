use course_matrix::catalog::CatalogParser;

const PAGE: &str = r#"
<html>
  <body>
    <div class="sidebar"><span class="nav">Courses A-Z</span></div>
    <div class="course-description " id="be-105-abc">
      <span class="course-description__label">BE/Bi 105 abc</span>
      <span class="course-description__title">Design Principles of Living Systems.</span>
      <span class="course-description__units">9 units (3-0-6)</span>
      <span class="course-description__terms">first, second, third terms</span>
      <span class="course-description__prerequisites">Prerequisites: BE 105 a, Bi 101; or instructor permission.</span>
      <span class="course-description__description">Quantitative analysis of cellular design.</span>
      <span class="course-description__instructors">Phillips, Hong</span>
    </div>
    <div class="course-description" id="cns-187">
      <span class="course-description__label">CNS 187</span>
      <span class="course-description__title">Neural Computation</span>
      <span class="course-description__units">9 units</span>
      <span class="course-description__description">
        Models of <i>computation</i> in nervous systems.
      </span>
    </div>
  </body>
</html>
"#;

#[test]
fn page_parses_into_ordered_records() {
    let records = CatalogParser::parse(PAGE);
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.id, "be-105-abc");
    assert_eq!(first.course, "BE/Bi 105 abc");
    assert_eq!(first.title, "Design Principles of Living Systems");
    assert_eq!(first.units, "9 units (3-0-6)");
    assert_eq!(first.terms_offered, "first, second, third terms");
    assert_eq!(first.instructors, "Phillips, Hong");

    let second = &records[1];
    assert_eq!(second.id, "cns-187");
    assert_eq!(second.course, "CNS 187");
}

#[test]
fn prerequisites_keep_only_recognized_course_codes() {
    let records = CatalogParser::parse(PAGE);
    assert_eq!(records[0].prerequisites, "BE105a, Bi101");
}

#[test]
fn inline_markup_in_descriptions_is_flattened() {
    let records = CatalogParser::parse(PAGE);
    assert_eq!(
        records[1].description,
        "Models of computation in nervous systems."
    );
}

#[test]
fn sidebar_markup_outside_course_blocks_is_ignored() {
    let records = CatalogParser::parse(PAGE);
    assert!(records.iter().all(|record| !record.course.contains("A-Z")));
}
