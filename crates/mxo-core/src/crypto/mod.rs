// ============================================
// File: crates/mxo-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Owns the auth server's RSA identities: the long-lived signing key that
//! clients are patched to trust, and the session key whose public half is
//! handed to clients inside a signed record.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: `SigningIdentity`, `SessionIdentity`, `ServerKeys`
//! - [`record`]: `PublicKeyRecord` build/parse/verify
//! - [`storage`]: `KeyStorage` trait with file and in-memory backends
//! - [`key_store`]: load-or-generate-or-regenerate bootstrap
//! - [`ops`]: `CryptoOps` trait and the RSA implementation
//!
//! ## Key Hierarchy
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  SigningIdentity (RSA-2048, e = 17)                        │
//! │  ├─ signPriv.dat: PKCS#1 DER private key                   │
//! │  ├─ signPub.dat: raw 256-byte modulus (client patching)    │
//! │  └─ Signs the session PublicKeyRecord (PKCS#1 v1.5, MD5)   │
//! │                       │                                    │
//! │                       ▼                                    │
//! │  SessionIdentity (RSA-1024, e = 17)                        │
//! │  ├─ privkey.dat: PKCS#1 DER private key                    │
//! │  ├─ pubkey.dat: signed PublicKeyRecord                     │
//! │  └─ OAEP-SHA1 encrypt/decrypt, PKCS#1 v1.5 MD5 sign/verify │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - MD5 and SHA-1 are fixed by the retail client. Do not "upgrade" them.
//! - The record signature covers the minimal modulus and exponent bytes,
//!   NOT their DER encodings
//! - Private keys are zeroed on drop by `rsa`; keep exported DER in
//!   `Zeroizing` buffers
//!
//! ## Last Modified
//! v0.1.0 - Initial RSA key lifecycle

pub mod key_store;
pub mod keys;
pub mod ops;
pub mod record;
pub mod storage;

// Re-export primary types at module level
pub use key_store::{validate_session, KeyStore};
pub use keys::{fingerprint, ServerKeys, SessionIdentity, SigningIdentity};
pub use ops::{build_public_key_record, CryptoOps, RsaCryptoOps};
pub use record::PublicKeyRecord;
pub use storage::{FileKeyStorage, KeySlot, KeyStorage, MemoryKeyStorage};

// ============================================
// Constants
// ============================================

/// Bit size of the signing key.
pub const SIGNING_KEY_BITS: usize = 2048;

/// Required length of the signing key's minimal modulus encoding.
pub const SIGNING_MODULUS_LEN: usize = 256;

/// Bit size of the session key.
pub const SESSION_KEY_BITS: usize = 1024;

/// Public exponent of both keys.
pub const PUBLIC_EXPONENT: u32 = 17;

/// Leading tag of a `PublicKeyRecord`.
pub const FORMAT_TAG: u32 = 4;

/// Separator between key material and signature in a `PublicKeyRecord`.
pub const RECORD_SEPARATOR: u8 = 0x00;

/// Output size of SHA-1, used by the OAEP padding bound.
pub const SHA1_DIGEST_LEN: usize = 20;
