// ============================================
// File: crates/mxo-core/src/crypto/key_store.rs
// ============================================
//! # Key Store
//!
//! ## Creation Reason
//! Brings the server's RSA identities up at startup: load what is on disk,
//! verify it, and regenerate anything missing or untrustworthy.
//!
//! ## Bootstrap Flow
//! ```text
//! ┌─────────────────────┐   ok    ┌──────────────────────┐
//! │ load signPriv.dat   │ ──────► │ SigningIdentity      │
//! └─────────┬───────────┘         └──────────┬───────────┘
//!           │ absent / corrupt               │
//!           ▼                                ▼
//!   generate 2048-bit (256-byte n)   ┌──────────────────────┐
//!   write signPriv + signPub         │ load privkey+pubkey  │
//!                                    └──────────┬───────────┘
//!                                               │ validate_session
//!                         ┌─────────────────────┴──────────┐
//!                         ▼ Verified                       ▼ IntegrityFailure
//!                   SessionIdentity            warn!, generate 1024-bit,
//!                                              sign record, rewrite both
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Read failures mean "absent"; only WRITE failures are returned
//! - The signing key is never rotated once it loads; clients are patched
//!   with its modulus
//! - A loaded signing key rewrites `signPub.dat` if it is missing or stale
//! - Validation is a pure function (`validate_session`) so every failure
//!   mode is testable without touching storage
//!
//! ## Last Modified
//! v0.1.0 - Initial bootstrap pipeline

use std::io;

use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::keys::{ServerKeys, SessionIdentity, SigningIdentity};
use super::record::PublicKeyRecord;
use super::storage::{KeySlot, KeyStorage};
use crate::error::{IntegrityFailure, Result};

// ============================================
// Validation
// ============================================

/// Checks persisted session material against the signing identity.
///
/// # Errors
/// Returns the first `IntegrityFailure` found: malformed private key,
/// malformed record, key mismatch or bad signature.
pub fn validate_session(
    private_der: &[u8],
    record_bytes: &[u8],
    signing: &SigningIdentity,
) -> std::result::Result<SessionIdentity, IntegrityFailure> {
    let private = SessionIdentity::parse_private_der(private_der)?;
    let record = PublicKeyRecord::parse(record_bytes, signing.signature_len())?;
    let identity = SessionIdentity::from_verified(private, record);
    identity
        .record()
        .verify_against(identity.public_key(), signing)?;
    Ok(identity)
}

// ============================================
// KeyStore
// ============================================

/// Loads, verifies and (re)generates the server's key material.
#[derive(Debug)]
pub struct KeyStore<S> {
    storage: S,
}

impl<S: KeyStorage> KeyStore<S> {
    /// Creates a key store over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the full bootstrap: signing identity, then session identity.
    ///
    /// Idempotent: a second run over valid files loads them unchanged.
    ///
    /// # Errors
    /// Returns `Persistence` if freshly generated material cannot be
    /// written, or `KeyGeneration` if RSA generation fails.
    pub fn bootstrap<R>(&self, rng: &mut R) -> Result<ServerKeys>
    where
        R: RngCore + CryptoRng,
    {
        let signing = self.load_or_create_signing_identity(rng)?;
        let session = self.load_or_create_session_identity(&signing, rng)?;
        info!(
            signing = %signing.fingerprint(),
            session = %session.fingerprint(),
            "Key material ready"
        );
        Ok(ServerKeys::new(signing, session))
    }

    /// Loads the signing identity, generating it if absent or unusable.
    ///
    /// # Errors
    /// Returns `Persistence` or `KeyGeneration`.
    pub fn load_or_create_signing_identity<R>(&self, rng: &mut R) -> Result<SigningIdentity>
    where
        R: RngCore + CryptoRng,
    {
        let slot = KeySlot::SigningPrivate;
        match self.storage.load(slot) {
            Ok(der) => match SigningIdentity::from_der(&der) {
                Ok(signing) => {
                    debug!(
                        path = %self.storage.describe(slot).display(),
                        fingerprint = %signing.fingerprint(),
                        "Loaded signing key"
                    );
                    self.restore_signing_public(&signing)?;
                    return Ok(signing);
                }
                Err(reason) => warn!(
                    path = %self.storage.describe(slot).display(),
                    %reason,
                    "Signing key unusable, generating a new one"
                ),
            },
            Err(e) => self.log_missing(slot, &e),
        }

        info!("Generating 2048-bit signing key");
        let signing = SigningIdentity::generate(rng)?;
        self.storage.store(slot, &signing.to_der()?)?;
        self.storage
            .store(KeySlot::SigningPublic, &signing.modulus_bytes())?;
        info!(
            fingerprint = %signing.fingerprint(),
            path = %self.storage.describe(KeySlot::SigningPublic).display(),
            "Signing key generated; patch clients with the new modulus"
        );
        Ok(signing)
    }

    /// Loads the session identity, regenerating it whenever its files are
    /// missing or fail verification against `signing`.
    ///
    /// # Errors
    /// Returns `Persistence`, `KeyGeneration` or `SignatureCreation`.
    pub fn load_or_create_session_identity<R>(
        &self,
        signing: &SigningIdentity,
        rng: &mut R,
    ) -> Result<SessionIdentity>
    where
        R: RngCore + CryptoRng,
    {
        match self.load_session_files() {
            Ok((private_der, record)) => match validate_session(&private_der, &record, signing) {
                Ok(session) => {
                    debug!(fingerprint = %session.fingerprint(), "Loaded session key");
                    return Ok(session);
                }
                Err(reason) => warn!(%reason, "Session key failed verification, regenerating"),
            },
            Err((slot, e)) => self.log_missing(slot, &e),
        }

        info!("Generating 1024-bit session key");
        let session = SessionIdentity::generate(signing, rng)?;
        self.storage
            .store(KeySlot::SessionPrivate, &session.to_der()?)?;
        self.storage
            .store(KeySlot::SessionPublicRecord, session.public_key_record())?;
        info!(fingerprint = %session.fingerprint(), "Session key generated");
        Ok(session)
    }

    fn load_session_files(
        &self,
    ) -> std::result::Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>), (KeySlot, io::Error)> {
        let private = self
            .storage
            .load(KeySlot::SessionPrivate)
            .map_err(|e| (KeySlot::SessionPrivate, e))?;
        let record = self
            .storage
            .load(KeySlot::SessionPublicRecord)
            .map_err(|e| (KeySlot::SessionPublicRecord, e))?;
        Ok((private, record))
    }

    /// Rewrites `signPub.dat` when it is missing or does not hold the
    /// loaded key's modulus.
    fn restore_signing_public(&self, signing: &SigningIdentity) -> Result<()> {
        let slot = KeySlot::SigningPublic;
        let modulus = signing.modulus_bytes();
        match self.storage.load(slot) {
            Ok(stored) if stored.as_slice() == modulus.as_slice() => return Ok(()),
            Ok(_) => warn!(
                path = %self.storage.describe(slot).display(),
                "Signing public key does not match signing key, rewriting"
            ),
            Err(e) => self.log_missing(slot, &e),
        }
        self.storage.store(slot, &modulus)?;
        info!(path = %self.storage.describe(slot).display(), "Signing public key restored");
        Ok(())
    }

    fn log_missing(&self, slot: KeySlot, err: &io::Error) {
        let path = self.storage.describe(slot);
        if err.kind() == io::ErrorKind::NotFound {
            info!(path = %path.display(), "Key file not found");
        } else {
            warn!(path = %path.display(), error = %err, "Key file unreadable");
        }
    }
}

// ============================================
// Tests
// ============================================
