//! In-memory tabular data shared by the survey, registrar, and matrix paths.
//!
//! A [`Table`] is an ordered list of column names plus string-valued rows.
//! Empty strings stand in for missing cells. CSV files load through the
//! `csv` crate; spreadsheet workbooks load through `calamine`. The teaching
//! matrix file keeps its real header on the second row, so loading accepts a
//! row offset.

use calamine::{open_workbook_auto, Data, Reader};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug)]
pub enum TableError {
    Io(std::io::Error),
    Csv(csv::Error),
    Spreadsheet(calamine::Error),
    MissingSheet(String),
    MissingHeader,
    MissingColumn(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io(err) => write!(f, "failed to read tabular file: {}", err),
            TableError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            TableError::Spreadsheet(err) => write!(f, "could not read workbook: {}", err),
            TableError::MissingSheet(name) => write!(f, "workbook has no sheet '{}'", name),
            TableError::MissingHeader => write!(f, "no header row found in tabular input"),
            TableError::MissingColumn(name) => write!(f, "required column '{}' is absent", name),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Io(err) => Some(err),
            TableError::Csv(err) => Some(err),
            TableError::Spreadsheet(err) => Some(err),
            TableError::MissingSheet(_)
            | TableError::MissingHeader
            | TableError::MissingColumn(_) => None,
        }
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<calamine::Error> for TableError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet(err)
    }
}

/// Ordered columns plus string-valued rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Loads a table from a path, dispatching on the file extension:
    /// `.xlsx`/`.xls`/`.ods` go through the workbook reader, everything else
    /// is treated as CSV. `skip_rows` banner rows are discarded before the
    /// header row.
    pub fn load_path<P: AsRef<Path>>(
        path: P,
        sheet: Option<&str>,
        skip_rows: usize,
    ) -> Result<Self, TableError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx") | Some("xls") | Some("xlsm") | Some("ods") => {
                Self::from_workbook_path(path, sheet, skip_rows)
            }
            _ => {
                let file = File::open(path)?;
                Self::from_csv_reader(file, skip_rows)
            }
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R, skip_rows: usize) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = csv_reader.records();
        for _ in 0..skip_rows {
            match records.next() {
                Some(record) => {
                    record?;
                }
                None => return Err(TableError::MissingHeader),
            }
        }

        let header = match records.next() {
            Some(record) => record?,
            None => return Err(TableError::MissingHeader),
        };
        let columns: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();

        let mut table = Table::new(columns);
        for record in records {
            let record = record?;
            table.push_row(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(table)
    }

    pub fn from_workbook_path<P: AsRef<Path>>(
        path: P,
        sheet: Option<&str>,
        skip_rows: usize,
    ) -> Result<Self, TableError> {
        let mut workbook = open_workbook_auto(path)?;
        let names = workbook.sheet_names().to_owned();
        let sheet_name = match sheet {
            Some(requested) => names
                .iter()
                .find(|name| name.as_str() == requested)
                .cloned()
                .ok_or_else(|| TableError::MissingSheet(requested.to_string()))?,
            None => names.first().cloned().ok_or(TableError::MissingHeader)?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows().skip(skip_rows);
        let columns: Vec<String> = rows
            .next()
            .ok_or(TableError::MissingHeader)?
            .iter()
            .map(cell_to_string)
            .collect();

        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row.iter().map(cell_to_string).collect());
        }
        Ok(table)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Index of `name`, adding the column (and padding every row) when it is
    /// not present yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        width - 1
    }

    pub fn rename_column(&mut self, index: usize, name: String) {
        if let Some(column) = self.columns.get_mut(index) {
            *column = name;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding or truncating it to the current column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn get(&self, row: usize, column_name: &str) -> Option<&str> {
        let index = self.column_index(column_name)?;
        Some(self.cell(row, index))
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        if let Some(cells) = self.rows.get_mut(row) {
            if column < cells.len() {
                cells[column] = value;
            }
        }
    }

    /// True when every cell of the column is empty.
    pub fn column_is_empty(&self, column: usize) -> bool {
        self.rows.iter().all(|row| {
            row.get(column)
                .map(|cell| cell.trim().is_empty())
                .unwrap_or(true)
        })
    }
}

/// Flattens a workbook cell to the string form the reconciler works with.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn loads_csv_with_header_offset() {
        let csv = "Teaching Matrix 2021-22,,\nCourse,Next,Future\nBE 105,,\n";
        let table = Table::from_csv_reader(Cursor::new(csv), 1).expect("table loads");
        assert_eq!(table.columns(), ["Course", "Next", "Future"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "Course"), Some("BE 105"));
    }

    #[test]
    fn missing_header_row_is_an_error() {
        let err = Table::from_csv_reader(Cursor::new(""), 0).expect_err("empty input");
        assert!(matches!(err, TableError::MissingHeader));
    }

    #[test]
    fn ensure_column_pads_existing_rows() {
        let mut table = Table::new(vec!["Course".to_string()]);
        table.push_row(vec!["BE 105".to_string()]);
        let index = table.ensure_column("Next");
        assert_eq!(index, 1);
        assert_eq!(table.cell(0, 1), "");
        // second call is a lookup, not a new column
        assert_eq!(table.ensure_column("Next"), 1);
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn ragged_rows_are_padded_to_the_header_width() {
        let csv = "Course,Next,Future\nBE 105\n";
        let table = Table::from_csv_reader(Cursor::new(csv), 0).expect("table loads");
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn column_is_empty_ignores_whitespace() {
        let mut table = Table::new(vec!["A".to_string(), "B".to_string()]);
        table.push_row(vec![" ".to_string(), "x".to_string()]);
        assert!(table.column_is_empty(0));
        assert!(!table.column_is_empty(1));
    }

    #[test]
    fn csv_round_trip_preserves_cells() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.csv");

        let mut table = Table::new(vec!["Course".to_string(), "Title".to_string()]);
        table.push_row(vec!["BE 105".to_string(), "Intro, to X".to_string()]);
        table.write_csv_path(&path).expect("write succeeds");

        let reloaded =
            Table::from_csv_reader(File::open(&path).expect("reopen"), 0).expect("reload");
        assert_eq!(reloaded, table);
    }

    #[test]
    fn require_column_reports_the_missing_name() {
        let table = Table::new(vec!["Course".to_string()]);
        let err = table.require_column("Name").expect_err("column absent");
        assert!(matches!(err, TableError::MissingColumn(name) if name == "Name"));
    }
}
