use crate::config::ConfigError;
use crate::faculty::FacultyError;
use crate::registrar::ImportError;
use crate::table::TableError;
use crate::telemetry::TelemetryError;
use std::fmt;

/// Top-level error for a reconciliation run, aggregated for the CLI.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Table(TableError),
    Import(ImportError),
    Faculty(FacultyError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Table(err) => write!(f, "table error: {}", err),
            AppError::Import(err) => write!(f, "registrar import error: {}", err),
            AppError::Faculty(err) => write!(f, "faculty roster error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Table(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Faculty(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TableError> for AppError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<FacultyError> for AppError {
    fn from(value: FacultyError) -> Self {
        Self::Faculty(value)
    }
}
