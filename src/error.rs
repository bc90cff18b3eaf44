//! Error handling for incubator.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// All errors that can occur while resolving, rendering and provisioning a project.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors that occur during template processing
    #[error("Template error: {0}.")]
    TemplateError(String),

    #[error("Template engine error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A template manifest could not be parsed.
    #[error("Manifest error in '{source_name}': {message}.")]
    ManifestError {
        source_name: String,
        message: String,
    },

    /// An absolute template path has no `files` directory.
    #[error("local template files directory not found: {path}")]
    LocalFilesNotFound { path: String },

    /// A relative template path does not exist in the cached repository.
    #[error("template directory not found: {path}")]
    TemplateDirNotFound { path: String },

    /// A source entry could not be read.
    #[error("Failed to read '{path}': {source}.")]
    ReadError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A template body failed to render.
    #[error("Failed to process '{path}': {source}.")]
    ProcessError {
        path: String,
        #[source]
        source: minijinja::Error,
    },

    /// A rendered entry could not be written to the target directory.
    #[error("Failed to write '{path}': {source}.")]
    WriteError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents errors that occur during hook script execution
    #[error("Hook execution error: {0}.")]
    HookError(String),

    /// Interactive input could not be read
    #[error("Prompt error: {0}.")]
    PromptError(String),

    /// Represents validation failures in user input or data
    #[error("Validation error: {0}.")]
    ValidationError(String),

    /// A git or gh command failed.
    #[error("{operation} failed: {message}")]
    GitError { operation: String, message: String },

    #[error("Git repository error: {0}.")]
    Git2Error(#[from] git2::Error),

    /// A required executable is not on PATH.
    #[error("{program} not found on PATH. {hint}")]
    CommandNotFound { program: String, hint: String },
}

impl Error {
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::GitError { operation: operation.into(), message: message.into() }
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error chain to stderr and exits with status code 1
pub fn default_error_handler(err: anyhow::Error) -> ! {
    eprintln!("Error: {err}");
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    std::process::exit(1);
}
