// ============================================
// File: crates/mxo-common/src/lib.rs
// ============================================
//! # MxO Common - Shared Buffer Library
//!
//! ## Creation Reason
//! Provides the cursor buffer and base error type that every wire
//! structure of the auth server is built on.
//!
//! ## Main Functionality
//! - [`buffer`]: `ByteBuffer` with independent read/write cursors
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  mxo-server                         │
//! │                      │                              │
//! │                      ▼                              │
//! │                  mxo-core                           │
//! │                      │                              │
//! │                      ▼                              │
//! │                 mxo-common  ◄── You are here        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod error;

// Re-export commonly used items at crate root
pub use buffer::{ByteBuffer, ByteOrder};
pub use error::{CommonError, Result};
