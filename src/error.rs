//! Error handling for owl.
//! Defines the error kinds produced while resolving, loading and
//! materializing a template, and the result alias used across the crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while creating a project from a template.
///
/// Resolution and config-loading kinds are raised before the destination
/// directory is touched. Everything after root creation leaves the partially
/// created project on disk.
#[derive(Error, Debug)]
pub enum Error {
    /// The template identifier was empty.
    #[error("No template passed.")]
    TemplateNotPassed,

    /// Neither the local search nor the remote fetch produced a template.
    #[error("No template found: '{template}'.")]
    TemplateNotFound { template: String },

    /// The destination project root is already present.
    #[error("Directory exists: '{path}'.")]
    DirExists { path: String },

    /// The version-control clone of a remote template failed.
    #[error("Failed to clone '{url}': {message}")]
    CloneFailed { url: String, message: String },

    /// A script command of the template config could not be rendered.
    #[error("Error parsing {bucket}: {message}")]
    ConfigParseFailed { bucket: String, message: String },

    /// A hook script failed to start or exited with a non-zero status.
    #[error("Error executing {script} script: {message}")]
    ScriptFailed { script: String, message: String },

    /// An ignore pattern could not be compiled.
    #[error("Ignore file error: {0}.")]
    IgnoreError(String),

    /// The template config file is malformed.
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors from the template engine
    #[error("Template render error: {0}")]
    MinijinjaError(#[from] minijinja::Error),
}

impl Error {
    /// Returns true when the error is raised before the destination project
    /// directory is created, so nothing needs to be cleaned up.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::TemplateNotPassed
                | Error::TemplateNotFound { .. }
                | Error::DirExists { .. }
                | Error::CloneFailed { .. }
                | Error::ConfigParseFailed { .. }
                | Error::ConfigError(_)
                | Error::MinijinjaError(_)
        )
    }
}

/// Convenience type alias for Results with owl's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("{err}");
    std::process::exit(1);
}
