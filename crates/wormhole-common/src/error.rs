// ============================================
// File: crates/wormhole-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides the base error type and result alias shared by all wormhole
//! crates. Crate-specific errors wrap `CommonError` transparently.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for validation and parsing failures
//! - `Result<T>`: Type alias using `CommonError`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across wormhole crates.
///
/// # Example
/// ```
/// use wormhole_common::error::{CommonError, Result};
///
/// fn validate_port(port: u32) -> Result<u16> {
///     u16::try_from(port).map_err(|_| CommonError::out_of_range(port, 0, u16::MAX))
/// }
///
/// assert!(validate_port(70_000).is_err());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    // ========================================
    // Validation Errors
    // ========================================

    /// Value is out of acceptable range.
    #[error("Value out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        /// The value that was out of range
        value: String,
        /// Minimum acceptable value
        min: String,
        /// Maximum acceptable value
        max: String,
    },

    // ========================================
    // Parse Errors
    // ========================================

    /// A textual literal (CIDR, address) could not be parsed.
    #[error("Cannot parse {kind} from '{input}': {reason}")]
    Parse {
        /// What was being parsed
        kind: &'static str,
        /// The offending input
        input: String,
        /// Why parsing failed
        reason: String,
    },
}

impl CommonError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `OutOfRange` error.
    pub fn out_of_range(
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates a `Parse` error.
    pub fn parse(kind: &'static str, input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::parse("CIDR", "10.0.0.0/40", "prefix length exceeds 32");
        assert!(err.to_string().contains("10.0.0.0/40"));
    }

    #[test]
    fn test_out_of_range_formatting() {
        let err = CommonError::out_of_range(12, 0, 9);
        assert_eq!(err.to_string(), "Value out of range: 12 not in [0, 9]");
    }
}
