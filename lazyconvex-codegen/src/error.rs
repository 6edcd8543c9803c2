//! Error types for code generation
//!
//! This module contains the error type shared by every stage of the pipeline.
//! Nothing is written to disk until all stages succeed, so any of these
//! aborts the run without partial output.

use std::path::PathBuf;

/// Error type for code generation
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Missing or invalid command-line input
    #[error("usage error: {0}")]
    Usage(String),

    /// Failed to read an input file or directory
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Schema document is not valid JSON or has the wrong shape
    #[error("schema parse error: {0}")]
    SchemaParse(String),

    /// Overlay config could not be parsed
    #[error("custom config parse error in '{}': {message}", .path.display())]
    ConfigParse {
        /// Config file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A validator kind the resolver has no mapping for
    #[error("unsupported validator kind '{kind}' at {model}.{field}")]
    UnsupportedValidator {
        /// The `type` tag of the offending node
        kind: String,
        /// Model (table or record) being resolved
        model: String,
        /// Field being resolved
        field: String,
    },

    /// Two different definitions synthesized the same name
    #[error("{kind} name collision: '{name}' is already registered with a different shape")]
    NameCollision {
        /// Synthesized name
        name: String,
        /// Registry that detected the clash (`enum` or `record`)
        kind: &'static str,
    },

    /// Failed to write an output file
    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    /// Build an [`GeneratorError::Io`] for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}
