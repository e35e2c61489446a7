// ============================================
// File: crates/mxo-server/src/error.rs
// ============================================
//! # Server Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial server error definitions

use std::net::SocketAddr;

use thiserror::Error;

use mxo_core::error::CoreError;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Invalid packet from {from_addr}: {reason}")]
    InvalidPacket {
        from_addr: String,
        reason: String,
    },

    #[error("Server failed to start: {reason}")]
    StartupFailed {
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ServerError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_packet(source: SocketAddr, reason: impl Into<String>) -> Self {
        Self::InvalidPacket {
            from_addr: source.to_string(),
            reason: reason.into(),
        }
    }

    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Malformed client input; the datagram is dropped and serving goes on.
    #[must_use]
    pub const fn is_packet_error(&self) -> bool {
        matches!(self, Self::InvalidPacket { .. })
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::StartupFailed { .. } => {
                true
            }
            Self::Core(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::config_load("/etc/mxo/auth.toml", "file not found");
        assert!(err.to_string().contains("/etc/mxo/auth.toml"));

        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let err = ServerError::invalid_packet(addr, "trailing bytes");
        assert!(err.to_string().contains("10.0.0.1:4000"));
        assert!(err.is_packet_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_classification() {
        let config_err = ServerError::config_invalid("port", "must be > 0");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let persist = ServerError::from(CoreError::persistence(
            "privkey.dat",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert!(persist.is_fatal());
        assert!(!ServerError::from(CoreError::Decryption).is_fatal());
    }
}
