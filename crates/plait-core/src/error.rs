//! Error types for plait-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::ast::TypeKind;

/// Result type for plait-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a compilation run.
///
/// Every failure is terminal for the call that produced it; the driver
/// never retries and never continues to a later pipeline stage after a
/// stage fails.
#[derive(Debug, Error)]
pub enum Error {
    /// Path resolution failed; carries the path as originally requested.
    #[error("cannot find file {}", path.display())]
    NotFound { path: PathBuf },

    /// The input's extension maps to no handling strategy.
    #[error("unknown file type passed to loader: {}", path.display())]
    UnsupportedInput { path: PathBuf },

    /// A subsystem rejected a file handed to it for loading.
    #[error("error loading {}: {message}", path.display())]
    LoadFailure { path: PathBuf, message: String },

    /// Compilation failed. The message is propagated verbatim from the
    /// backend compiler; `context` carries additional diagnostic text
    /// when the backend supplies any.
    #[error("{message}")]
    Compile {
        message: String,
        context: Option<String>,
    },

    /// The glue-compilation step reported failure.
    #[error("glue compilation failed")]
    Glue,

    /// Registry lookup missed.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Registry lookup hit, but the stored definition has a different
    /// structural kind than the caller expected.
    #[error("'{id}' is not of expected type (want {expected})")]
    WrongKind { id: String, expected: TypeKind },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Additional context text, present only on compile failures that
    /// carry any. Callers report it after the error's description.
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Compile { context, .. } => context.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_requested_path() {
        let err = Error::NotFound {
            path: PathBuf::from("missing.plait"),
        };
        assert!(err.to_string().contains("missing.plait"));
    }

    #[test]
    fn compile_context_accessor() {
        let err = Error::Compile {
            message: "resolution failed".into(),
            context: Some("while resolving module a".into()),
        };
        assert_eq!(err.to_string(), "resolution failed");
        assert_eq!(err.context(), Some("while resolving module a"));

        let err = Error::Glue;
        assert_eq!(err.context(), None);
        assert_eq!(err.to_string(), "glue compilation failed");
    }
}
