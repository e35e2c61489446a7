// ============================================
// File: crates/mxo-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides the error type shared by the buffer layer and every crate
//! built on it, so a short read surfaces the same way everywhere.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for buffer and encoding operations
//! - `Result<T>`: Type alias using `CommonError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include key material in error messages
//! - `TruncatedInput` is always recoverable: callers reject the input,
//!   they never abort on it
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

/// Common error types shared across the MxO crates.
///
/// # Example
/// ```
/// use mxo_common::error::CommonError;
/// use mxo_common::ByteBuffer;
///
/// let mut buf = ByteBuffer::from_vec(vec![0x04]);
/// buf.read_u8().unwrap();
/// let err = buf.read_u8().unwrap_err();
/// assert!(matches!(err, CommonError::TruncatedInput { .. }));
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    // ========================================
    // Input Errors
    // ========================================

    /// Not enough bytes left for a declared field.
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Bytes the field required
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Invalid input data provided.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the field or parameter
        field: String,
        /// Description of what's wrong
        reason: String,
    },

    // ========================================
    // Encoding Errors
    // ========================================

    /// Failed to decode data.
    #[error("Decoding error: {context}")]
    Decoding {
        /// What was being decoded
        context: String,
        /// Error details
        details: String,
    },
}

impl CommonError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `TruncatedInput` error.
    #[must_use]
    pub const fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedInput { needed, available }
    }

    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the input was malformed or short.
    ///
    /// These come from untrusted peers and are answered by dropping
    /// the input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::TruncatedInput { .. } | Self::InvalidInput { .. } | Self::Decoding { .. }
        )
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<hex::FromHexError> for CommonError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Decoding {
            context: "hex decode".into(),
            details: err.to_string(),
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
        let err = CommonError::truncated(2, 1);
        assert!(err.to_string().contains("needed 2"));
        assert!(err.to_string().contains("1 available"));

        let err = CommonError::invalid_input("sky", "too long");
        assert!(err.to_string().contains("sky"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CommonError::truncated(4, 0).is_input_error());
        assert!(CommonError::invalid_input("f", "bad").is_input_error());
        assert!(CommonError::from(hex::FromHexError::OddLength).is_input_error());
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: CommonError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, CommonError::Decoding { .. }));
    }
}
