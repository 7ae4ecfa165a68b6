//! Error types for console-state.
//!
//! Store mutations never fail: missing paths resolve to defaulted containers.
//! Errors exist only at the edges, when loading configuration, validating a
//! path against a declared [`Shape`](crate::Shape) or decoding a typed read.

use crate::Path;
use thiserror::Error;

/// Result type alias for console-state operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A path names a field the declared shape does not have.
    #[error("unknown field `{field}` at {path}")]
    UnknownField {
        /// Path up to and including the offending segment.
        path: Path,
        field: String,
    },

    /// A segment of the wrong kind for the container the shape declares.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    /// A path continues below a node the shape declares as a leaf.
    #[error("path descends below leaf at {path}")]
    BelowLeaf { path: Path },

    /// Configuration is structurally invalid.
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[inline]
    pub fn unknown_field(path: Path, field: impl Into<String>) -> Self {
        StoreError::UnknownField {
            path,
            field: field.into(),
        }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        StoreError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn below_leaf(path: Path) -> Self {
        StoreError::BelowLeaf { path }
    }

    #[inline]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        StoreError::InvalidConfig {
            message: message.into(),
        }
    }

    /// The path the error refers to, when it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreError::UnknownField { path, .. }
            | StoreError::TypeMismatch { path, .. }
            | StoreError::BelowLeaf { path } => Some(path),
            _ => None,
        }
    }
}
