//! Error types for the consistency checker

use std::path::PathBuf;

/// Error type for a check run
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// No `convex/` directory with a `_generated/` child was found
    #[error("could not find convex/ directory with _generated/ under '{}'", .0.display())]
    ConvexDirNotFound(PathBuf),

    /// No sibling of the convex directory carries a schema marker
    #[error("could not find schema file with lazyconvex markers in '{}'", .0.display())]
    SchemaNotFound(PathBuf),

    /// Failed to read a directory or file
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Module scanning failed
    #[error(transparent)]
    Scan(#[from] lazyconvex_codegen::GeneratorError),
}

impl CheckError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }
}
