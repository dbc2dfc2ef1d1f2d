use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all nuspect operations.
#[derive(Debug, Error, Diagnostic)]
pub enum NuspectError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The project description is not a well-formed MSBuild project.
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check that the project file is well-formed MSBuild XML"))]
    Manifest { message: String },

    /// A version or version range expression could not be parsed.
    #[error("Invalid version: {message}")]
    Version { message: String },

    /// A package source returned data that could not be interpreted.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Configuration file could not be read or parsed.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.nuspect/config.toml for syntax errors"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
