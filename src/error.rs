//! Error types for storage sessions, parsing and node access.
//!
//! Every failure is reported synchronously at the operation that caused it.
//! Nothing is retried internally.
//!
//! ## Error Categories
//!
//! [`Error::kind`] folds the concrete variants into the coarse categories
//! callers usually branch on:
//!
//! - **Io**: the backing file could not be opened, read, or persisted
//! - **Format**: the text is not well-formed storage syntax (line/column included)
//! - **Key**: a key is malformed, duplicated, missing, or names no registered codec
//! - **Index**: a sequence position is out of range
//! - **Type**: a node was coerced to a type it does not hold
//! - **Structure**: unbalanced `begin_*`/`end` nesting, or a call that the
//!   session state does not allow
//!
//! ## Examples
//!
//! ```rust
//! use serde_fstorage::{from_str, ErrorKind};
//!
//! let err = from_str("num1: 1").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Format);
//! assert!(err.to_string().contains("line 1"));
//! ```

use std::fmt;
use thiserror::Error;

/// All errors produced by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while opening, reading or persisting the backing file
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed storage text
    #[error("Format error at line {line}, column {col}: {msg}")]
    Format { line: usize, col: usize, msg: String },

    /// Key outside the permitted character set
    #[error("Invalid key {0:?}: key names may only contain alphanumeric characters [a-zA-Z0-9], '-', '_' and ' '")]
    InvalidKey(String),

    /// Key written twice in the same mapping
    #[error("Duplicate key {0:?} in the current mapping")]
    DuplicateKey(String),

    /// Lookup of a key that the mapping does not hold
    #[error("Key {0:?} not found")]
    MissingKey(String),

    /// No codec registered under this tag
    #[error("No codec registered for tag {0:?}")]
    UnknownCodec(String),

    /// Sequence position out of range
    #[error("Index {index} out of range for sequence of length {len}")]
    Index { index: usize, len: usize },

    /// Coercion to a type the node does not hold
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Unbalanced nesting or an operation the session state rejects
    #[error("Structure error: {0}")]
    Structure(String),

    /// Matrix data length disagrees with its dimensions
    #[error("Matrix shape error: {rows}x{cols}x{channels} needs {expected} elements, found {found}")]
    Shape {
        rows: usize,
        cols: usize,
        channels: usize,
        expected: usize,
        found: usize,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

/// Coarse error category, see the module documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Format,
    Key,
    Index,
    Type,
    Structure,
}

impl Error {
    /// Creates a format error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_fstorage::Error;
    ///
    /// let err = Error::format(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn format(line: usize, col: usize, msg: &str) -> Self {
        Error::Format {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_fstorage::Error;
    ///
    /// let err = Error::type_mismatch("integer", "string");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn structure(msg: &str) -> Self {
        Error::Structure(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the coarse category of this error.
    ///
    /// [`Error::Shape`] counts as a type error and [`Error::Custom`], which
    /// only the Serde bridge produces, as a format error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Format { .. } | Error::Custom(_) => ErrorKind::Format,
            Error::InvalidKey(_)
            | Error::DuplicateKey(_)
            | Error::MissingKey(_)
            | Error::UnknownCodec(_) => ErrorKind::Key,
            Error::Index { .. } => ErrorKind::Index,
            Error::TypeMismatch { .. } | Error::Shape { .. } => ErrorKind::Type,
            Error::Structure(_) => ErrorKind::Structure,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
