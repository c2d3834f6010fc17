//! Error types for template loading, generation and requirement checks

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the core library
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// Errors produced by the scaffolding engine
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Template bundle (or template root) does not exist
    #[error("template not found: {0}")]
    NotFound(String),

    /// Metadata file is unreadable or is not valid YAML for the descriptor schema
    #[error("malformed template metadata in {path}: {message}")]
    MalformedMetadata { path: PathBuf, message: String },

    /// Descriptor parsed but failed structural validation
    #[error("invalid template {template}: {message}")]
    InvalidTemplate { template: String, message: String },

    /// Loading the descriptor for a generation run failed
    #[error("failed to load template {name}: {source}")]
    TemplateLoad {
        name: String,
        #[source]
        source: Box<ScaffoldError>,
    },

    /// Template source could not be parsed
    #[error("template syntax error in {name}: {message}")]
    TemplateSyntax { name: String, message: String },

    /// Template parsed but failed while being evaluated
    #[error("template execution error in {name}: {message}")]
    TemplateExecution { name: String, message: String },

    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file failed to generate; carries the destination that triggered it
    #[error("failed to generate file {path}: {source}")]
    Generation {
        path: PathBuf,
        #[source]
        source: Box<ScaffoldError>,
    },

    /// Generation metadata could not be serialized
    #[error("failed to serialize generation metadata: {0}")]
    Metadata(#[source] serde_yaml::Error),

    /// Unparsable version string or constraint
    #[error("invalid version '{input}': {message}")]
    InvalidVersion { input: String, message: String },

    /// Project name rejected by validation
    #[error("invalid project name: {0}")]
    InvalidProjectName(String),

    /// Global settings file could not be read or parsed
    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl ScaffoldError {
    /// Attach a path to an I/O error
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_version(input: &str, message: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.to_string(),
            message: message.into(),
        }
    }
}
