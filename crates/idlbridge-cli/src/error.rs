use std::path::PathBuf;

use idlbridge_model::ModelError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// CLI-specific error type that provides rich diagnostics
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Failed to {action} file {}", .path.display())]
    #[diagnostic(code(idlbridge::cli::io_error))]
    IoError {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(idlbridge::cli::config_error))]
    ConfigError {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },

    #[error("No `{key}` configured")]
    #[diagnostic(
        code(idlbridge::cli::missing_setting),
        help("Set it in the configuration file or pass the matching command-line flag")
    )]
    MissingSetting { key: &'static str },

    #[error("No outputs requested")]
    #[diagnostic(
        code(idlbridge::cli::no_outputs),
        help("Add an [outputs] entry to the configuration or pass --typescript, --nan, --napi or --jsi")
    )]
    NoOutputs,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error("Generation produced {count} diagnostic(s) and warnings are denied")]
    #[diagnostic(
        code(idlbridge::cli::diagnostics_denied),
        help("Fix the reported members or drop --deny-warnings")
    )]
    DiagnosticsDenied { count: usize },
}

/// Convert IO errors with context
pub fn convert_io_error(error: std::io::Error, action: &'static str, path: PathBuf) -> CliError {
    CliError::IoError {
        action,
        path,
        source: error,
    }
}

/// Convert TOML errors, pointing at the offending span of `source`
pub fn convert_toml_error(error: toml::de::Error, path: &str, source: &str) -> CliError {
    CliError::ConfigError {
        src: NamedSource::new(path, source.to_string()),
        span: error.span().map(SourceSpan::from),
        message: error.message().to_string(),
    }
}
