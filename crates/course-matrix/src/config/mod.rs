use crate::registrar::ImportOptions;
use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of the tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a reconciliation run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let subjects = match env::var("MATRIX_SUBJECTS") {
            Ok(raw) => {
                let subjects: Vec<String> = raw
                    .split(',')
                    .map(|subject| subject.trim().to_string())
                    .filter(|subject| !subject.is_empty())
                    .collect();
                if subjects.is_empty() {
                    return Err(ConfigError::EmptySubjects);
                }
                subjects
            }
            Err(_) => ImportOptions::default().subjects,
        };

        let last_name_only = env::var("MATRIX_LAST_NAME_ONLY")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            import: ImportConfig {
                subjects,
                last_name_only,
            },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Registrar-import settings carried from the environment into
/// [`ImportOptions`].
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub subjects: Vec<String>,
    pub last_name_only: bool,
}

impl ImportConfig {
    pub fn to_options(&self) -> ImportOptions {
        ImportOptions {
            subjects: self.subjects.clone(),
            last_name_only: self.last_name_only,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EmptySubjects,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptySubjects => {
                write!(f, "MATRIX_SUBJECTS must list at least one subject code")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("MATRIX_SUBJECTS");
        env::remove_var("MATRIX_LAST_NAME_ONLY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.import.subjects, ["BE", "Bi", "BMB", "CNS", "NB"]);
        assert!(!config.import.last_name_only);
    }

    #[test]
    fn subject_list_parses_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MATRIX_SUBJECTS", "BE, Ge");
        env::set_var("MATRIX_LAST_NAME_ONLY", "true");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.import.subjects, ["BE", "Ge"]);
        assert!(config.import.last_name_only);
        reset_env();
    }

    #[test]
    fn empty_subject_list_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MATRIX_SUBJECTS", " , ");
        let err = AppConfig::load().expect_err("blank subjects rejected");
        assert!(matches!(err, ConfigError::EmptySubjects));
        reset_env();
    }
}
