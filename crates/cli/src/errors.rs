//! Error display using miette for contextual error reporting
//!
//! Parse failures carry the project file as source code so miette can point
//! at the offending line.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Failed to {operation} {}", path.display())]
    #[diagnostic(
        code(frcpm::cli::file_error),
        help("Check file permissions and ensure the path exists")
    )]
    FileError {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse project file: {message}")]
    #[diagnostic(code(frcpm::cli::parse_error))]
    ParseError {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("error occurred here")]
        error_span: Option<SourceSpan>,
        #[help]
        help_text: Option<String>,
    },

    #[error("Invalid command line argument: {argument}")]
    #[diagnostic(code(frcpm::cli::invalid_argument))]
    InvalidArgument {
        argument: String,
        #[help]
        suggestion: Option<String>,
    },

    #[error("Project check failed: {rejected} rejected dependencies, {issues} graph issues")]
    #[diagnostic(
        code(frcpm::cli::check_failed),
        help("Fix the dependencies listed above and run 'frcpm check' again")
    )]
    CheckFailed { rejected: usize, issues: usize },

    #[error("Failed to render output")]
    #[diagnostic(code(frcpm::cli::output_error))]
    OutputError {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] frcpm_dependency_graph::Error),
}

impl CliError {
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileError {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    pub fn parse_error(
        file_name: impl AsRef<str>,
        src: impl Into<String>,
        message: impl Into<String>,
        error_span: Option<SourceSpan>,
    ) -> Self {
        Self::ParseError {
            message: message.into(),
            src: NamedSource::new(file_name, src.into()),
            error_span,
            help_text: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        if let Self::ParseError { help_text, .. } = &mut self {
            *help_text = Some(help.into());
        }
        self
    }

    pub fn invalid_argument(argument: impl Into<String>, suggestion: Option<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            suggestion,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::OutputError { source }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
