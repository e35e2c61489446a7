// ============================================
// File: crates/mxo-core/src/lib.rs
// ============================================
//! # MxO Core - Keys & Framing Library
//!
//! ## Creation Reason
//! Provides the two bit-exact halves of the auth front-end: the RSA
//! identity lifecycle clients verify the server against, and the ordered
//! packet framing every datagram travels in.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Per-field byte-order table
//! - `SubPacket` / `MsgBlock` / `OrderedPacket` with bounded sizes
//! - Binary codec with strict whole-buffer decoding
//! - Fixed-layout command payload builders
//!
//! ### Crypto Module ([`crypto`])
//! - `SigningIdentity` / `SessionIdentity` (RSA, exponent 17)
//! - `PublicKeyRecord` build, parse and verification
//! - `KeyStore` bootstrap over pluggable `KeyStorage`
//! - `CryptoOps` (OAEP-SHA1, PKCS#1 v1.5 MD5)
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 mxo-server                          │
//! │                     │                               │
//! │                     ▼                               │
//! │                 mxo-core   ◄── You are here         │
//! │                     │                               │
//! │                     ▼                               │
//! │                 mxo-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every decoder must return an error, never panic, on hostile input
//! - Wire layouts are pinned by test vectors; change them together
//! - NEVER log private key material; use fingerprints
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{
    CryptoOps, FileKeyStorage, KeyStore, KeyStorage, MemoryKeyStorage, PublicKeyRecord,
    RsaCryptoOps, ServerKeys, SessionIdentity, SigningIdentity,
};
pub use error::{CoreError, FramingViolation, IntegrityFailure, Result};
pub use protocol::{
    decode_ordered_packet_exact, encode_ordered_packet, MsgBlock, OrderedPacket, SubPacket,
};
