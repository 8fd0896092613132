//! Error types for the CLI

use bytecode_system::ModuleError;
use instrumenter::RewriteError;
use localizer::LocalizeError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O error
    #[error("file error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON
    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Manifest is not valid YAML
    #[error("invalid manifest {}: {source}", path.display())]
    ManifestYaml {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest does not name exactly one test module
    #[error("manifest must declare exactly one test module, found {0}")]
    TestModules(usize),

    /// Module read/write error
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Rewrite pass error
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Search driver error
    #[error(transparent)]
    Localize(#[from] LocalizeError),

    /// Directory walk error
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Report serialization error
    #[error("failed to serialize report: {0}")]
    Report(#[source] serde_json::Error),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
