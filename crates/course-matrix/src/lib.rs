pub mod catalog;
pub mod config;
pub mod error;
pub mod faculty;
pub mod matrix;
pub mod names;
pub mod registrar;
pub mod survey;
pub mod table;
pub mod telemetry;
