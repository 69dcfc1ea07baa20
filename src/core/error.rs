// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for voxio.
//!
//! Errors fall into two groups:
//! - Caller errors: a bad index, a duplicate registration, touching a closed session
//! - Resource errors: a dataset that cannot be opened, or a storage fault while
//!   reading or writing a unit
//!
//! "No format found" is not an error for the registry search itself; it only
//! becomes [`DatasetError::NoFormat`] in the convenience helpers that search and
//! open in one call.

use thiserror::Error;

/// Errors raised by formats, sessions and the format registry.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset resource could not be acquired when a session was opened.
    #[error("Failed to open '{location}' with format '{format}': {reason}")]
    Open {
        /// Format that attempted the open
        format: String,
        /// Location from the request
        location: String,
        /// Why the open failed
        reason: String,
    },

    /// A session was used after it had been closed.
    #[error("{session} is already closed")]
    UseAfterClose {
        /// Session kind and format, e.g. "stack reader"
        session: String,
    },

    /// Malformed or out-of-range index.
    #[error("Invalid index {index}: {reason}")]
    Index {
        /// Rendered index
        index: String,
        /// Why the index was rejected
        reason: String,
    },

    /// Registry invariant violation on registration.
    #[error("Format '{name}' {reason}")]
    Duplicate {
        /// Name of the offending format
        name: String,
        /// Which invariant was violated
        reason: String,
    },

    /// No registered format accepts the request.
    #[error("No format can {operation} '{location}'")]
    NoFormat {
        /// "read" or "write"
        operation: &'static str,
        /// Location from the request
        location: String,
    },

    /// Storage fault during data access.
    #[error("I/O error in {context}: {source}")]
    Io {
        /// What was being accessed
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Argument rejected by a driver (wrong dtype, wrong shape, missing option).
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Argument name
        argument: String,
        /// Why it was rejected
        reason: String,
    },

    /// Manifest or metadata (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl DatasetError {
    /// Create an open error.
    pub fn open(
        format: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        DatasetError::Open {
            format: format.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a use-after-close error.
    pub fn use_after_close(session: impl Into<String>) -> Self {
        DatasetError::UseAfterClose {
            session: session.into(),
        }
    }

    /// Create an index error.
    pub fn index(index: impl ToString, reason: impl Into<String>) -> Self {
        DatasetError::Index {
            index: index.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate registration error.
    pub fn duplicate(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DatasetError::Duplicate {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DatasetError::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error for corrupt stored data (truncated chunk, bad checksum).
    pub fn corrupt(context: impl Into<String>, message: impl Into<String>) -> Self {
        DatasetError::Io {
            context: context.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, message.into()),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        DatasetError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call might succeed.
    ///
    /// Only storage faults qualify; everything else is a caller error or a
    /// permanent condition of the dataset.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DatasetError::Io { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            DatasetError::Open {
                format,
                location,
                reason,
            } => vec![
                ("format", format.clone()),
                ("location", location.clone()),
                ("reason", reason.clone()),
            ],
            DatasetError::UseAfterClose { session } => vec![("session", session.clone())],
            DatasetError::Index { index, reason } => {
                vec![("index", index.clone()), ("reason", reason.clone())]
            }
            DatasetError::Duplicate { name, reason } => {
                vec![("name", name.clone()), ("reason", reason.clone())]
            }
            DatasetError::NoFormat {
                operation,
                location,
            } => vec![
                ("operation", operation.to_string()),
                ("location", location.clone()),
            ],
            DatasetError::Io { context, source } => {
                vec![("context", context.clone()), ("source", source.to_string())]
            }
            DatasetError::InvalidArgument { argument, reason } => {
                vec![("argument", argument.clone()), ("reason", reason.clone())]
            }
            DatasetError::Serialization(err) => vec![("message", err.to_string())],
            DatasetError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io {
            context: "storage".to_string(),
            source: err,
        }
    }
}

/// Result type for voxio operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
