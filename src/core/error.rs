//! Error types for record conversion and configuration
//!
//! The analytics themselves never fail: short histories and zero denominators
//! fall back to documented defaults. Errors are reserved for wrong data, such
//! as a record missing a required field or a sprint history that goes
//! backwards.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::diagnostics::ConfigSyntaxError;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("{record} row is missing required field '{field}'")]
    #[diagnostic(
        code(sprintlens::record::missing_field),
        help("the data-access layer must supply every required field of a record")
    )]
    MissingField { record: &'static str, field: &'static str },

    #[error("{record} row has an invalid value: {message}")]
    #[diagnostic(code(sprintlens::record::invalid_field))]
    InvalidField { record: &'static str, message: String },

    #[error("sprint history is not strictly increasing: sprint {current} follows sprint {previous}")]
    #[diagnostic(
        code(sprintlens::record::sprint_order),
        help("sort sprints by sprint_number and remove duplicates before analysis")
    )]
    NonIncreasingSprint { previous: u32, current: u32 },

    #[error("sprint {sprint_number} has non-positive team capacity {capacity}")]
    #[diagnostic(code(sprintlens::record::capacity))]
    InvalidCapacity { sprint_number: u32, capacity: f64 },

    #[error("failed to read config file {path:?}: {source}")]
    #[diagnostic(code(sprintlens::config::io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    ConfigSyntax(#[from] ConfigSyntaxError),

    #[error("invalid value for {var}: {value:?}")]
    #[diagnostic(code(sprintlens::config::env))]
    ConfigEnv { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = Error::MissingField {
            record: "Sprint",
            field: "team_capacity",
        };
        let msg = err.to_string();
        assert!(msg.contains("Sprint"));
        assert!(msg.contains("team_capacity"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = Error::NonIncreasingSprint {
            previous: 4,
            current: 4,
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("sprintlens::record::sprint_order"));
    }
}
