//! Input limits for untrusted payloads and path expressions
//!
//! Parsing entry points without a `_with_limits` suffix use
//! [`DataLimits::default`].

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// Configurable limits for parsing and path resolution
///
/// # Example
///
/// ```
/// use courier_data::DataLimits;
///
/// let limits = DataLimits::default();
/// assert_eq!(limits.max_path_steps, 100);
///
/// let strict = DataLimits::strict();
/// assert!(strict.check_nesting_depth(64).is_err());
///
/// // Missing fields fall back to the defaults
/// let loaded: DataLimits = serde_json::from_str(r#"{"max_path_steps": 8}"#).unwrap();
/// assert_eq!(loaded.max_path_steps, 8);
/// assert_eq!(loaded.max_nesting_depth, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLimits {
    /// Deepest container nesting accepted from a payload
    pub max_nesting_depth: usize,

    /// Maximum number of steps in a path expression
    pub max_path_steps: usize,

    /// Maximum size of a textual or binary payload
    pub max_payload_bytes: usize,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
            max_path_steps: 100,
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl DataLimits {
    /// Permissive limits for trusted sources
    pub const fn permissive() -> Self {
        Self {
            max_nesting_depth: 512,
            max_path_steps: 1_000,
            max_payload_bytes: 256 * 1024 * 1024,
        }
    }

    /// Strict limits for untrusted input
    pub const fn strict() -> Self {
        Self {
            max_nesting_depth: 32,
            max_path_steps: 20,
            max_payload_bytes: 1024 * 1024,
        }
    }

    /// No limits (use with caution!)
    pub const fn unlimited() -> Self {
        Self {
            max_nesting_depth: usize::MAX,
            max_path_steps: usize::MAX,
            max_payload_bytes: usize::MAX,
        }
    }

    /// Validate nesting depth
    #[inline]
    pub fn check_nesting_depth(&self, depth: usize) -> DataResult<()> {
        check("nesting depth", self.max_nesting_depth, depth)
    }

    /// Validate path step count
    #[inline]
    pub fn check_path_steps(&self, steps: usize) -> DataResult<()> {
        check("path steps", self.max_path_steps, steps)
    }

    /// Validate payload size
    #[inline]
    pub fn check_payload_bytes(&self, bytes: usize) -> DataResult<()> {
        check("payload bytes", self.max_payload_bytes, bytes)
    }
}

fn check(limit: &'static str, max: usize, actual: usize) -> DataResult<()> {
    if actual > max {
        Err(DataError::limit_exceeded(limit, max, actual))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = DataLimits::default();
        assert!(limits.check_nesting_depth(128).is_ok());
        assert!(limits.check_nesting_depth(129).is_err());
        assert!(limits.check_payload_bytes(16 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_unlimited() {
        let limits = DataLimits::unlimited();
        assert!(limits.check_path_steps(usize::MAX).is_ok());
    }

    #[test]
    fn test_limit_error() {
        let err = DataLimits::strict().check_path_steps(21).unwrap_err();
        assert_eq!(
            err,
            DataError::LimitExceeded {
                limit: "path steps",
                max: 20,
                actual: 21
            }
        );
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_serde_roundtrip() {
        let limits = DataLimits::permissive();
        let json = serde_json::to_string(&limits).unwrap();
        let back: DataLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(back, limits);
    }
}
