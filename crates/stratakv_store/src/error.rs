//! Error taxonomy and engine status translation.

use rocksdb::ErrorKind;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// This is a closed taxonomy: every outcome the engine can report maps to
/// exactly one variant. Engine-internal failure conditions with no
/// differentiated recovery (corruption, merge-in-progress, incomplete,
/// shutdown-in-progress, timed-out, aborted) are folded into [`Failure`],
/// which keeps the originating condition as a `reason` for diagnostics.
///
/// [`Failure`]: StoreError::Failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key or collection does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// A collection with this name already exists.
    #[error("collection already exists: {name}")]
    Exists {
        /// The conflicting collection name.
        name: String,
    },

    /// An argument was rejected by the engine or by the adapter.
    #[error("invalid argument: {message}")]
    Invalid {
        /// Description of the rejected argument.
        message: String,
    },

    /// A device or filesystem failure.
    #[error("I/O error: {message}")]
    Io {
        /// The engine's I/O error message.
        message: String,
    },

    /// The operation is not supported, e.g. a mutation in read-only mode.
    #[error("not implemented: {message}")]
    NotImplemented {
        /// Which operation was refused and why.
        message: String,
    },

    /// Residual engine failures with no differentiated recovery path.
    #[error("engine failure ({reason}): {detail}")]
    Failure {
        /// The engine condition, e.g. "corruption" or "timed out".
        reason: &'static str,
        /// The engine's original message.
        detail: String,
    },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an already-exists error.
    pub fn exists(name: impl Into<String>) -> Self {
        Self::Exists { name: name.into() }
    }

    /// Creates an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Creates a not-implemented error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented {
            message: message.into(),
        }
    }

    /// Creates a residual failure carrying the engine's message.
    pub fn failure(reason: &'static str, detail: impl Into<String>) -> Self {
        Self::Failure {
            reason,
            detail: detail.into(),
        }
    }
}

/// Maps an engine outcome code onto the taxonomy.
///
/// The mapping is total: unlisted and future engine kinds fall through to
/// [`StoreError::Failure`] with the engine message preserved.
pub(crate) fn translate(kind: ErrorKind, detail: String) -> StoreError {
    match kind {
        ErrorKind::NotFound => StoreError::NotFound { what: detail },
        ErrorKind::InvalidArgument => StoreError::Invalid { message: detail },
        ErrorKind::IOError => StoreError::Io { message: detail },
        ErrorKind::NotSupported => StoreError::NotImplemented { message: detail },
        ErrorKind::Corruption => StoreError::failure("corruption", detail),
        ErrorKind::MergeInProgress => StoreError::failure("merge in progress", detail),
        ErrorKind::Incomplete => StoreError::failure("incomplete", detail),
        ErrorKind::ShutdownInProgress => StoreError::failure("shutdown in progress", detail),
        ErrorKind::TimedOut => StoreError::failure("timed out", detail),
        ErrorKind::Aborted => StoreError::failure("aborted", detail),
        _ => StoreError::failure("other reason", detail),
    }
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        let kind = e.kind();
        translate(kind, e.into_string())
    }
}
