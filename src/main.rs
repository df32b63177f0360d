use chrono::Local;
use clap::{Args, Parser, Subcommand};
use course_matrix::catalog::CatalogParser;
use course_matrix::config::AppConfig;
use course_matrix::error::AppError;
use course_matrix::faculty;
use course_matrix::matrix::{apply_registrar, apply_survey, ReconcileOutcome};
use course_matrix::registrar::{self, CourseOffering};
use course_matrix::survey::SurveyTable;
use course_matrix::table::Table;
use course_matrix::telemetry;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "coursematrix",
    about = "Reconcile catalog, registrar, and survey data into a teaching matrix",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a catalog markup page into course records
    Catalog(CatalogArgs),
    /// Aggregate a registrar export into one row per offering
    Registrar(RegistrarArgs),
    /// Flatten the faculty workbook into a name/rank roster
    Faculty(FacultyArgs),
    /// Merge survey and/or registrar data into a teaching matrix
    UpdateMatrix(UpdateMatrixArgs),
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Catalog page saved as markup
    #[arg(long)]
    input: PathBuf,
    /// Destination CSV of course records
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct RegistrarArgs {
    /// Registrar export (CSV or workbook)
    #[arg(long)]
    input: PathBuf,
    /// Worksheet name when the input is a workbook
    #[arg(long)]
    sheet: Option<String>,
    /// Destination CSV of aggregated offerings
    #[arg(long)]
    output: PathBuf,
    /// Render instructors as last names only
    #[arg(long)]
    last_name_only: bool,
}

#[derive(Args, Debug)]
struct FacultyArgs {
    /// Faculty workbook with tenure-track and non-tenure-track sheets
    #[arg(long)]
    input: PathBuf,
    /// Destination CSV of the flattened roster
    #[arg(long)]
    output: PathBuf,
    /// Also load affiliated faculty (not yet supported; fails fast)
    #[arg(long)]
    affiliated: bool,
}

#[derive(Args, Debug)]
struct UpdateMatrixArgs {
    /// Teaching-matrix file; its real header sits on the second row
    #[arg(long)]
    matrix: PathBuf,
    /// Teaching-interest survey export to merge
    #[arg(long)]
    survey: Option<PathBuf>,
    /// Registrar export to merge enrollment/instructor data from
    #[arg(long)]
    registrar: Option<PathBuf>,
    /// Worksheet name when the registrar input is a workbook
    #[arg(long)]
    registrar_sheet: Option<String>,
    /// Destination for the updated matrix
    #[arg(long)]
    output: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Catalog(args) => run_catalog(args),
        Command::Registrar(args) => run_registrar(args, &config),
        Command::Faculty(args) => run_faculty(args),
        Command::UpdateMatrix(args) => run_update_matrix(args, &config),
    }
}

fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let page = std::fs::read_to_string(&args.input)?;
    let records = CatalogParser::parse(&page);
    info!(count = records.len(), input = %args.input.display(), "parsed catalog page");

    let file = std::fs::File::create(&args.output)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in &records {
        writer
            .serialize(record)
            .map_err(course_matrix::table::TableError::Csv)?;
    }
    writer.flush()?;

    print_summary(json!({
        "command": "catalog",
        "courses": records.len(),
        "output": args.output.display().to_string(),
    }));
    Ok(())
}

fn run_registrar(args: RegistrarArgs, config: &AppConfig) -> Result<(), AppError> {
    let mut options = config.import.to_options();
    options.last_name_only |= args.last_name_only;

    let offerings = load_offerings(&args.input, args.sheet.as_deref(), &options)?;
    info!(count = offerings.len(), input = %args.input.display(), "aggregated registrar export");

    offerings_table(&offerings).write_csv_path(&args.output)?;
    print_summary(json!({
        "command": "registrar",
        "offerings": offerings.len(),
        "output": args.output.display().to_string(),
    }));
    Ok(())
}

fn run_faculty(args: FacultyArgs) -> Result<(), AppError> {
    let records = faculty::load_workbook(&args.input, args.affiliated)?;
    info!(count = records.len(), "flattened faculty workbook");

    let mut table = Table::new(vec!["Name".to_string(), "Rank".to_string()]);
    for record in &records {
        table.push_row(vec![record.name.clone(), record.rank.clone()]);
    }
    table.write_csv_path(&args.output)?;

    print_summary(json!({
        "command": "faculty",
        "faculty": records.len(),
        "output": args.output.display().to_string(),
    }));
    Ok(())
}

fn run_update_matrix(args: UpdateMatrixArgs, config: &AppConfig) -> Result<(), AppError> {
    // the matrix file carries a banner row above the real header
    let mut matrix = Table::load_path(&args.matrix, None, 1)?;
    info!(rows = matrix.len(), matrix = %args.matrix.display(), "loaded teaching matrix");

    let mut survey_outcome: Option<ReconcileOutcome> = None;
    if let Some(survey_path) = &args.survey {
        let survey = SurveyTable::from_table(Table::load_path(survey_path, None, 0)?);
        let outcome = apply_survey(&mut matrix, &survey)?;
        info!(matched = outcome.matched, "merged survey preferences");
        survey_outcome = Some(outcome);
    }

    let mut registrar_outcome: Option<ReconcileOutcome> = None;
    if let Some(registrar_path) = &args.registrar {
        let offerings = load_offerings(
            registrar_path,
            args.registrar_sheet.as_deref(),
            &config.import.to_options(),
        )?;
        let outcome = apply_registrar(&mut matrix, &offerings)?;
        info!(matched = outcome.matched, "merged registrar enrollment data");
        registrar_outcome = Some(outcome);
    }

    matrix.write_csv_path(&args.output)?;
    print_summary(json!({
        "command": "update-matrix",
        "generated": Local::now().date_naive().to_string(),
        "rows": matrix.len(),
        "survey": survey_outcome.map(outcome_json),
        "registrar": registrar_outcome.map(outcome_json),
        "output": args.output.display().to_string(),
    }));
    Ok(())
}

fn load_offerings(
    path: &Path,
    sheet: Option<&str>,
    options: &registrar::ImportOptions,
) -> Result<Vec<CourseOffering>, AppError> {
    let table = Table::load_path(path, sheet, 0)?;
    let rows = registrar::rows_from_table(&table)?;
    Ok(registrar::import_offerings(rows, options)?)
}

fn offerings_table(offerings: &[CourseOffering]) -> Table {
    let columns = [
        "Course",
        "Title",
        "Sections",
        "Instructors",
        "Type",
        "AY",
        "Term",
        "Enrollment",
    ];
    let mut table = Table::new(columns.into_iter().map(str::to_string).collect());
    for offering in offerings {
        table.push_row(vec![
            offering.course.clone(),
            offering.title.clone(),
            offering.sections.to_string(),
            offering.instructor_list(),
            offering.course_type.clone(),
            offering.academic_year.clone().unwrap_or_default(),
            offering
                .term
                .map(|term| term.code().to_string())
                .unwrap_or_default(),
            offering.enrollment.to_string(),
        ]);
    }
    table
}

fn outcome_json(outcome: ReconcileOutcome) -> serde_json::Value {
    json!({
        "matched": outcome.matched,
        "skipped_missing_course": outcome.skipped_missing_course,
        "skipped_no_match": outcome.skipped_no_match,
        "skipped_no_data": outcome.skipped_no_data,
    })
}

fn print_summary(summary: serde_json::Value) {
    println!("{summary}");
}
