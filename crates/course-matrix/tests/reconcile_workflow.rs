use course_matrix::matrix::{apply_registrar, apply_survey};
use course_matrix::registrar::{import_offerings, parse_rows, ImportOptions};
use course_matrix::survey::SurveyTable;
use course_matrix::table::Table;
use std::io::Cursor;

fn matrix_from_csv(csv: &str) -> Table {
    // teaching-matrix files carry a banner row above the real header
    Table::from_csv_reader(Cursor::new(csv), 1).expect("matrix loads")
}

#[test]
fn registrar_export_flows_into_matrix_year_columns() {
    let export = "OFFERING_NAME,OFFERING_TITLE,SECTION,INSTRUCTOR,NUM_ENROLLED,TERM_NAME,Research,DEPARTMENT_NAME,DIVISION\n\
Bi 8,Cell Biology,01,John Smith,45,FA 20-21,N,Bi,Bi Division\n\
Bi 8,Cell Biology,01,Sarah Jones,45,FA 20-21,N,Bi,Bi Division\n";

    let options = ImportOptions {
        last_name_only: true,
        ..ImportOptions::default()
    };
    let rows = parse_rows(export.as_bytes()).expect("export parses");
    let offerings = import_offerings(rows, &options).expect("offerings aggregate");

    assert_eq!(offerings.len(), 1);
    assert_eq!(offerings[0].enrollment, 45, "co-instructor must not double count");
    assert_eq!(offerings[0].instructor_list(), "Smith; Jones");

    let mut matrix = matrix_from_csv("Teaching Matrix,\nCourse,Units\nBi 008 1 ,9\n");
    let outcome = apply_registrar(&mut matrix, &offerings).expect("reconcile");

    assert_eq!(outcome.matched, 1);
    assert_eq!(matrix.get(0, "20-21 enroll"), Some("45"));
    assert_eq!(matrix.get(0, "20-21 Instructor(s)"), Some("Smith; Jones"));
}

#[test]
fn multi_section_offering_sums_each_section_once() {
    let export = "OFFERING_NAME,OFFERING_TITLE,SECTION,INSTRUCTOR,NUM_ENROLLED,TERM_NAME,Research,DEPARTMENT_NAME,DIVISION\n\
BE 150,Lab Topics,01,Rob Phillips,10,WI 20-21,N,BE,Bi Division\n\
BE 150,Lab Topics,02,Rob Phillips,15,WI 20-21,N,BE,Bi Division\n\
BE 150,Lab Topics,02,Elizabeth Hong,15,WI 20-21,N,BE,Bi Division\n\
BE 150,Lab Topics,03,Stephen Mayo,5,WI 20-21,N,BE,Bi Division\n";

    let rows = parse_rows(export.as_bytes()).expect("export parses");
    let offerings = import_offerings(rows, &ImportOptions::default()).expect("aggregate");

    assert_eq!(offerings.len(), 1);
    assert_eq!(offerings[0].sections, 3);
    assert_eq!(offerings[0].enrollment, 30);
    assert_eq!(
        offerings[0].instructor_list(),
        "Phillips, Rob; Hong, Betty; Mayo, Steve"
    );
}

#[test]
fn survey_preferences_aggregate_into_matrix_rows() {
    let survey_csv = "Name,Interest [BE 105 - Design Principles],Interest [Bi 1 - Intro]\n\
Rob Phillips,Would like to teach this course next year,\n\
David Van Valen,Would like to teach this course next year,Interested in teaching this course at some point\n\
R. Phillips,Would like to teach this course next year,\n";

    let survey = SurveyTable::from_table(
        Table::from_csv_reader(Cursor::new(survey_csv), 0).expect("survey loads"),
    );

    let mut matrix = matrix_from_csv(
        "Teaching Matrix,\nCourse,Units\nBE 0105,9\nBi 001,6\nPh 2,9\n",
    );
    let outcome = apply_survey(&mut matrix, &survey).expect("reconcile");

    assert_eq!(outcome.matched, 2);
    assert_eq!(outcome.skipped_no_match, 1, "Ph 2 has no survey column");

    // three respondents, one duplicated surname after canonicalization
    assert_eq!(matrix.get(0, "Next"), Some("Phillips; Van Valen"));
    assert_eq!(matrix.get(1, "Future"), Some("Van Valen"));
    assert_eq!(matrix.get(1, "Next"), Some(""));
}

#[test]
fn survey_and_registrar_updates_compose_on_one_matrix() {
    let survey_csv = "Name,Interest [Bi 8 - Cell Biology]\n\
Betty Hong,\"Have taught in the past, would like to teach again\"\n";
    let survey = SurveyTable::from_table(
        Table::from_csv_reader(Cursor::new(survey_csv), 0).expect("survey loads"),
    );

    let export = "OFFERING_NAME,OFFERING_TITLE,SECTION,INSTRUCTOR,NUM_ENROLLED,TERM_NAME,Research,DEPARTMENT_NAME,DIVISION\n\
Bi 8,Cell Biology,01,Elizabeth Hong,32,SP 21-22,N,Bi,Bi Division\n";
    let rows = parse_rows(export.as_bytes()).expect("export parses");
    let offerings = import_offerings(rows, &ImportOptions::default()).expect("aggregate");

    let mut matrix = matrix_from_csv("Teaching Matrix,\nCourse,Units\nBi 8,6\n");
    apply_survey(&mut matrix, &survey).expect("survey pass");
    apply_registrar(&mut matrix, &offerings).expect("registrar pass");

    assert_eq!(matrix.get(0, "Again"), Some("Hong"));
    assert_eq!(matrix.get(0, "21-22 enroll"), Some("32"));
    assert_eq!(matrix.get(0, "21-22 Instructor(s)"), Some("Hong, Betty"));
}
