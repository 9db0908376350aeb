//! Data layer error types
//!
//! Every failure in this crate is one of three things:
//!
//! - a **parsing error**: a required value is missing or null, a value has no
//!   coercion path to the requested kind, or a JSON/binary payload is
//!   malformed;
//! - a **contract violation**: the caller passed something the API forbids,
//!   such as a path string outside the grammar or an insertion that would
//!   make a tree cyclic;
//! - a **bounds violation**: a required positional read or a non-optional
//!   index step fell outside `[0, len)`.

use std::fmt;

use thiserror::Error;

use crate::kind::NodeKind;

/// Where inside a container a value was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Key(String),
    Index(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key '{key}'"),
            Self::Index(index) => write!(f, "index {index}"),
        }
    }
}

impl From<&str> for Location {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for Location {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Data layer errors
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Required value is absent
    #[error("Unable to resolve value at {location}: value is missing")]
    Missing { location: Location },

    /// Required value is explicitly null
    #[error("Unable to resolve value at {location}: value is null")]
    Null { location: Location },

    /// Value present but with no coercion path to the requested kind
    #[error("Cannot parse value at {location} as {expected}: found {actual} value {value}")]
    TypeMismatch {
        location: Location,
        expected: &'static str,
        actual: NodeKind,
        value: String,
    },

    /// String value could not be parsed as the requested kind
    #[error("Cannot parse value at {location} as {target}: invalid text '{value}'")]
    InvalidText {
        location: Location,
        target: &'static str,
        value: String,
    },

    /// Malformed textual payload or wrong root kind
    #[error("Invalid JSON payload: {0}")]
    Json(String),

    /// Malformed binary payload
    #[error("Invalid binary payload: {0}")]
    Binary(String),

    /// Stream source failed while reading
    #[error("Failed to read payload: {0}")]
    Io(String),

    /// Path string does not match the path grammar
    #[error("Invalid path '{path}' at position {position}: {reason}")]
    InvalidPath {
        path: String,
        position: usize,
        reason: String,
    },

    /// Caller violated an API contract
    #[error("Contract violation: {reason}")]
    Contract { reason: String },

    /// Array index out of bounds
    #[error("Index {index} out of bounds (length: {length})")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Configured limit exceeded
    #[error("{limit} exceeded: {actual} > {max}")]
    LimitExceeded {
        limit: &'static str,
        max: usize,
        actual: usize,
    },

    /// Context information (nested error with additional info)
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// Create a missing value error
    pub fn missing(location: impl Into<Location>) -> Self {
        Self::Missing {
            location: location.into(),
        }
    }

    /// Create a null value error
    pub fn null(location: impl Into<Location>) -> Self {
        Self::Null {
            location: location.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        location: impl Into<Location>,
        expected: &'static str,
        actual: NodeKind,
        value: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            location: location.into(),
            expected,
            actual,
            value: value.into(),
        }
    }

    /// Create an invalid text error
    pub fn invalid_text(
        location: impl Into<Location>,
        target: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidText {
            location: location.into(),
            target,
            value: value.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Create a contract violation
    pub fn contract(reason: impl Into<String>) -> Self {
        Self::Contract {
            reason: reason.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Create a limit exceeded error
    pub fn limit_exceeded(limit: &'static str, max: usize, actual: usize) -> Self {
        Self::LimitExceeded { limit, max, actual }
    }

    /// Add context to an error
    pub fn with_context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Add path context
    pub fn at_path(self, path: impl fmt::Display) -> Self {
        self.with_context(format!("at path '{path}'"))
    }

    /// The error with all context layers removed
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl DataError {
    /// Get error code for monitoring
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "DATA_MISSING",
            Self::Null { .. } => "DATA_NULL",
            Self::TypeMismatch { .. } => "DATA_TYPE_MISMATCH",
            Self::InvalidText { .. } => "DATA_INVALID_TEXT",
            Self::Json(_) => "DATA_JSON",
            Self::Binary(_) => "DATA_BINARY",
            Self::Io(_) => "DATA_IO",
            Self::InvalidPath { .. } => "DATA_INVALID_PATH",
            Self::Contract { .. } => "DATA_CONTRACT",
            Self::IndexOutOfBounds { .. } => "DATA_INDEX_OUT_OF_BOUNDS",
            Self::LimitExceeded { .. } => "DATA_LIMIT_EXCEEDED",
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// Missing, null, incompatible or malformed data
    pub fn is_parsing_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Missing { .. }
                | Self::Null { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidText { .. }
                | Self::Json(_)
                | Self::Binary(_)
                | Self::Io(_)
        )
    }

    /// Caller broke an API contract before any data was touched
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::InvalidPath { .. } | Self::Contract { .. } | Self::LimitExceeded { .. }
        )
    }

    /// Positional access outside the container
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.root_cause(), Self::IndexOutOfBounds { .. })
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            Self::Io(error.to_string())
        } else {
            Self::Json(error.to_string())
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<courier_etf::EtfError> for DataError {
    fn from(error: courier_etf::EtfError) -> Self {
        Self::Binary(error.to_string())
    }
}

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;
