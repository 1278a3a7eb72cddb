//! Error types for annotation repository operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a format backend while encoding or decoding a list.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid format structure or content
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// Required attribute or element is missing
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// Invalid coordinate values
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates {
        /// Description of the coordinate error
        message: String,
    },

    /// Version mismatch between expected and found
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version string
        expected: String,
        /// Found version string
        found: String,
    },
}

impl FormatError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid coordinates error.
    pub fn invalid_coordinates(message: impl Into<String>) -> Self {
        Self::InvalidCoordinates {
            message: message.into(),
        }
    }
}

/// Errors surfaced by a [`Repository`](crate::format::Repository) or the
/// annotation service.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No source has been bound to the repository
    #[error("Repository has no source bound")]
    Unbound,

    /// Loading from the bound source failed
    #[error("Failed to load annotations from {source_path:?}: {error}")]
    Load {
        /// Source the load was issued for
        source_path: PathBuf,
        /// Underlying format error
        #[source]
        error: FormatError,
    },

    /// Saving to the bound source failed
    #[error("Failed to save annotations to {source_path:?}: {error}")]
    Save {
        /// Source the save was issued for
        source_path: PathBuf,
        /// Underlying format error
        #[source]
        error: FormatError,
    },

    /// No registered format handles the given source
    #[error("No annotation format registered for {path:?}")]
    UnknownFormat {
        /// Path whose extension was not recognized
        path: PathBuf,
    },
}
