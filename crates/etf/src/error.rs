//! Error type for term encoding and decoding.

use thiserror::Error;

/// Failures raised while decoding a term payload.
///
/// Encoding is infallible; every variant here describes a malformed or
/// unsupported payload.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EtfError {
    /// The leading byte is not the supported format version
    #[error("Unsupported format version: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    /// Payload ended before a complete term was read
    #[error("Unexpected end of payload: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// Tag byte not handled by this codec
    #[error("Unsupported term tag: {0}")]
    UnknownTag(u8),

    /// Atom or string payload is not valid UTF-8
    #[error("Term contains invalid UTF-8 text")]
    InvalidUtf8,

    /// Big integer does not fit in 128 bits
    #[error("Integer magnitude of {0} bytes is out of range")]
    IntegerOutOfRange(usize),

    /// List whose tail is not the empty list
    #[error("Improper lists are not supported")]
    ImproperList,

    /// Nesting deeper than the decoder allows
    #[error("Term nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    /// Bytes left over after the root term
    #[error("{0} trailing bytes after root term")]
    TrailingBytes(usize),
}

impl EtfError {
    /// Get error code for monitoring
    pub fn code(&self) -> &'static str {
        match self {
            Self::VersionMismatch { .. } => "ETF_VERSION_MISMATCH",
            Self::UnexpectedEof { .. } => "ETF_UNEXPECTED_EOF",
            Self::UnknownTag(_) => "ETF_UNKNOWN_TAG",
            Self::InvalidUtf8 => "ETF_INVALID_UTF8",
            Self::IntegerOutOfRange(_) => "ETF_INTEGER_OUT_OF_RANGE",
            Self::ImproperList => "ETF_IMPROPER_LIST",
            Self::DepthExceeded(_) => "ETF_DEPTH_EXCEEDED",
            Self::TrailingBytes(_) => "ETF_TRAILING_BYTES",
        }
    }
}

/// Result type alias for codec operations
pub type EtfResult<T> = Result<T, EtfError>;
