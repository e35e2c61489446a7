// ============================================
// File: crates/mxo-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for the framing codec and the RSA key lifecycle
//! in the MxO core crate.
//!
//! ## Main Functionality
//! - `CoreError`: Primary error enum for core operations
//! - `FramingViolation`: Structural faults in ordered packets
//! - `IntegrityFailure`: Reasons a persisted session identity is rejected
//!
//! ## Error Categories
//! 1. **Framing Errors**: wrong opcode, empty sub-packet or container,
//!    trailing bytes, oversized collections
//! 2. **Integrity Errors**: tampered or corrupt key files (handled inside
//!    the key store by regeneration)
//! 3. **Crypto Errors**: encrypt/decrypt/sign/verify failures
//! 4. **Persistence Errors**: freshly generated keys could not be written
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - `Persistence` is the only error that should stop server startup
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::path::PathBuf;

use thiserror::Error;

use mxo_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// FramingViolation
// ============================================

/// Structural fault found while encoding or decoding ordered packets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingViolation {
    /// Container opcode was not `0x04`.
    #[error("unexpected opcode 0x{0:02x}")]
    UnexpectedOpcode(u8),

    /// A sub-packet declared length 0.
    #[error("zero-length sub-packet")]
    EmptySubPacket,

    /// The container declared zero blocks.
    #[error("ordered packet has no blocks")]
    EmptyContainer,

    /// Bytes were left over after a complete decode.
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// A collection exceeds what its length field can express.
    #[error("{what} count {actual} exceeds limit {max}")]
    LimitExceeded {
        /// Which collection
        what: &'static str,
        /// Maximum representable count
        max: usize,
        /// Requested count
        actual: usize,
    },
}

// ============================================
// IntegrityFailure
// ============================================

/// Why a persisted session identity was not trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFailure {
    /// Record did not start with format tag 4.
    #[error("format tag {0}, expected 4")]
    FormatTag(u32),

    /// Separator byte between key and signature was not 0.
    #[error("separator byte 0x{0:02x}, expected 0x00")]
    Separator(u8),

    /// Record is shorter than its fixed parts.
    #[error("record truncated")]
    Truncated,

    /// DER integers in the record could not be parsed.
    #[error("malformed DER key material: {0}")]
    MalformedDer(String),

    /// Private key file could not be parsed.
    #[error("malformed private key: {0}")]
    MalformedPrivateKey(String),

    /// Key has the wrong modulus size.
    #[error("modulus is {actual} bytes, expected {expected}")]
    KeySize {
        /// Required minimal modulus length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// Record modulus/exponent differ from the private key.
    #[error("record does not match private key")]
    KeyMismatch,

    /// Signing identity rejected the record signature.
    #[error("record signature does not verify")]
    BadSignature,
}

// ============================================
// CoreError
// ============================================

/// Core error types for framing and cryptographic operations.
///
/// # Security Note
/// Error messages are designed to be informative for debugging
/// without revealing sensitive information like key material.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Framing Errors
    // ========================================

    /// Packet structure is invalid.
    #[error("Invalid framing: {0}")]
    InvalidFraming(#[from] FramingViolation),

    // ========================================
    // Key Integrity Errors
    // ========================================

    /// Persisted key material failed verification.
    #[error("Key integrity failure: {0}")]
    KeyIntegrity(#[from] IntegrityFailure),

    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Failed to generate an RSA key.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// Why encryption failed
        context: String,
    },

    /// Decryption failed (malformed or mismatched ciphertext).
    #[error("Decryption failed")]
    Decryption,

    /// Signature creation failed.
    #[error("Failed to create signature: {reason}")]
    SignatureCreation {
        /// Why signing failed
        reason: String,
    },

    // ========================================
    // Persistence Errors
    // ========================================

    /// Generated key material could not be written.
    #[error("Failed to persist key material to {path}")]
    Persistence {
        /// Target file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates an `Encryption` error.
    pub fn encryption(context: impl Into<String>) -> Self {
        Self::Encryption {
            context: context.into(),
        }
    }

    /// Creates a `SignatureCreation` error.
    pub fn signature_creation(reason: impl Into<String>) -> Self {
        Self::SignatureCreation {
            reason: reason.into(),
        }
    }

    /// Creates a `Persistence` error.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Creates a `LimitExceeded` framing error.
    #[must_use]
    pub const fn limit_exceeded(what: &'static str, max: usize, actual: usize) -> Self {
        Self::InvalidFraming(FramingViolation::LimitExceeded { what, max, actual })
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the input bytes were short or structurally wrong.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFraming(_) | Self::Common(CommonError::TruncatedInput { .. })
        )
    }

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::KeyGeneration { .. }
                | Self::Encryption { .. }
                | Self::Decryption
                | Self::SignatureCreation { .. }
                | Self::KeyIntegrity(_)
        )
    }

    /// Returns `true` if this error might indicate an attack.
    ///
    /// These errors warrant additional logging/monitoring.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::Decryption
                | Self::KeyIntegrity(IntegrityFailure::BadSignature | IntegrityFailure::KeyMismatch)
                | Self::InvalidFraming(FramingViolation::TrailingBytes(_))
        )
    }

    /// Returns `true` if the server cannot continue starting up.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::KeyGeneration { .. })
    }
}

// ============================================
// Tests
// ============================================
