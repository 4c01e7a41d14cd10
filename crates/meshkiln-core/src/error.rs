//! Unified error handling for meshkiln
//!
//! This module provides the error type shared by the export pipeline,
//! the artifact reader and the driver.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all meshkiln operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination artifact file could not be created
    #[error("Cannot create artifact {path}: {source}")]
    CreateArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Artifact Errors ====================

    /// Artifact bytes do not match the expected layout
    #[error("Invalid artifact data: {message}")]
    InvalidArtifact {
        message: String,
    },

    /// Artifact kind could not be recognized
    #[error("Unknown artifact kind: {name}")]
    UnknownKind {
        name: String,
    },

    // ==================== Scene Errors ====================

    /// Scene fits none of the three artifact kinds
    #[error("Scene contains no meshes and no animations; nothing to export")]
    EmptyScene,

    /// Animation clip export was requested for a scene without animations
    #[error("Scene contains no animations; cannot export an animation clip")]
    NoAnimations,

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid artifact error
    pub fn invalid_artifact(message: impl Into<String>) -> Self {
        Error::InvalidArtifact {
            message: message.into(),
        }
    }

    /// Create an unknown artifact kind error
    pub fn unknown_kind(name: impl Into<String>) -> Self {
        Error::UnknownKind { name: name.into() }
    }

    /// Check if this is an I/O-level error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::CreateArtifact { .. })
    }

    /// Check if this is a malformed-artifact error
    pub fn is_invalid_artifact(&self) -> bool {
        matches!(
            self,
            Error::InvalidArtifact { .. } | Error::UnknownKind { .. }
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
