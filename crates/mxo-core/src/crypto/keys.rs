// ============================================
// File: crates/mxo-core/src/crypto/keys.rs
// ============================================
//! # RSA Identity Types
//!
//! ## Creation Reason
//! Wraps the two RSA key pairs the auth server holds so the rest of the
//! crate never touches raw `rsa` keys or padding choices directly.
//!
//! ## Main Functionality
//! - `SigningIdentity`: RSA-2048 key that vouches for session keys
//! - `SessionIdentity`: RSA-1024 key plus its signed `PublicKeyRecord`
//! - `ServerKeys`: both identities after bootstrap
//! - `fingerprint`: short log-safe identifier of a public key
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  SigningIdentity (Long-term)                               │
//! │  ├─ Generated once, never rotated                          │
//! │  └─ Modulus shipped to clients out of band                 │
//! │                                                            │
//! │  SessionIdentity (Replaceable)                             │
//! │  ├─ Regenerated whenever its files fail verification       │
//! │  └─ Record signature cached, never re-signed per request   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Debug` output shows fingerprints only
//! - The signing modulus MUST be exactly 256 bytes when minimally encoded;
//!   clients patch it into a fixed-size slot
//!
//! ## Last Modified
//! v0.1.0 - Initial identity types

use std::fmt;

use md5::{Digest, Md5};
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use super::record::PublicKeyRecord;
use super::{PUBLIC_EXPONENT, SESSION_KEY_BITS, SIGNING_KEY_BITS, SIGNING_MODULUS_LEN};
use crate::error::{CoreError, IntegrityFailure, Result};

// ============================================
// Shared Helpers
// ============================================

/// Returns a short hex fingerprint of a public key.
///
/// First 8 bytes of SHA-256 over the minimal modulus encoding. Safe to log.
#[must_use]
pub fn fingerprint(public: &RsaPublicKey) -> String {
    let digest = Sha256::digest(public.n().to_bytes_be());
    hex::encode(&digest[..8])
}

/// Minimal big-endian encoding of the modulus.
pub(crate) fn modulus_bytes(public: &RsaPublicKey) -> Vec<u8> {
    public.n().to_bytes_be()
}

/// Minimal big-endian encoding of the public exponent.
pub(crate) fn exponent_bytes(public: &RsaPublicKey) -> Vec<u8> {
    public.e().to_bytes_be()
}

/// RSASSA-PKCS1-v1_5 over the MD5 digest of `message`.
pub(crate) fn pkcs1_md5_sign<R>(
    private: &RsaPrivateKey,
    rng: &mut R,
    message: &[u8],
) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    let hashed = Md5::digest(message);
    private
        .sign_with_rng(rng, Pkcs1v15Sign::new::<Md5>(), &hashed)
        .map_err(|e| CoreError::signature_creation(e.to_string()))
}

/// Checks an RSASSA-PKCS1-v1_5 MD5 signature.
pub(crate) fn pkcs1_md5_verify(public: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let hashed = Md5::digest(message);
    public
        .verify(Pkcs1v15Sign::new::<Md5>(), &hashed, signature)
        .is_ok()
}

fn generate_key<R>(rng: &mut R, bits: usize) -> Result<RsaPrivateKey>
where
    R: RngCore + CryptoRng,
{
    let exponent = BigUint::from(PUBLIC_EXPONENT);
    RsaPrivateKey::new_with_exp(rng, bits, &exponent)
        .map_err(|e| CoreError::key_generation(format!("{bits}-bit key: {e}")))
}

fn parse_private_der(der: &[u8]) -> std::result::Result<RsaPrivateKey, IntegrityFailure> {
    RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| IntegrityFailure::MalformedPrivateKey(e.to_string()))
}

fn export_private_der(private: &RsaPrivateKey, what: &str) -> Result<Zeroizing<Vec<u8>>> {
    let doc = private
        .to_pkcs1_der()
        .map_err(|e| CoreError::key_generation(format!("encode {what} key: {e}")))?;
    Ok(Zeroizing::new(doc.as_bytes().to_vec()))
}

// ============================================
// SigningIdentity
// ============================================

/// Long-term RSA-2048 key that signs session public key records.
///
/// # Example
/// ```no_run
/// use mxo_core::crypto::SigningIdentity;
/// use rand::rngs::OsRng;
///
/// let signing = SigningIdentity::generate(&mut OsRng).unwrap();
/// assert_eq!(signing.modulus_bytes().len(), 256);
/// ```
pub struct SigningIdentity {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl SigningIdentity {
    /// Generates a signing key whose minimal modulus is 256 bytes.
    ///
    /// Short candidates are discarded and generation retries until one
    /// fits; there is no attempt limit.
    ///
    /// # Errors
    /// Returns `KeyGeneration` only if the RSA backend itself fails.
    pub fn generate<R>(rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let private = generate_key(rng, SIGNING_KEY_BITS)?;
            let public = RsaPublicKey::from(&private);
            let len = public.n().to_bytes_be().len();
            if len == SIGNING_MODULUS_LEN {
                return Ok(Self { private, public });
            }
            debug!(attempt, modulus_len = len, "Discarding signing key candidate");
        }
    }

    /// Loads a signing key from PKCS#1 DER.
    ///
    /// # Errors
    /// - `MalformedPrivateKey` if the DER does not parse
    /// - `KeySize` if the modulus is not 256 bytes
    pub fn from_der(der: &[u8]) -> std::result::Result<Self, IntegrityFailure> {
        let private = parse_private_der(der)?;
        let public = RsaPublicKey::from(&private);
        let len = public.n().to_bytes_be().len();
        if len != SIGNING_MODULUS_LEN {
            return Err(IntegrityFailure::KeySize {
                expected: SIGNING_MODULUS_LEN,
                actual: len,
            });
        }
        Ok(Self { private, public })
    }

    /// Exports the private key as PKCS#1 DER.
    ///
    /// # Errors
    /// Returns `KeyGeneration` if encoding fails.
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        export_private_der(&self.private, "signing")
    }

    /// Returns the public half.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Raw 256-byte modulus, as written to `signPub.dat`.
    #[must_use]
    pub fn modulus_bytes(&self) -> Vec<u8> {
        modulus_bytes(&self.public)
    }

    /// Length in bytes of signatures produced by this key.
    #[must_use]
    pub fn signature_len(&self) -> usize {
        self.public.size()
    }

    /// Signs `message` with PKCS#1 v1.5 over MD5.
    ///
    /// # Errors
    /// Returns `SignatureCreation` on failure.
    pub fn sign<R>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng,
    {
        pkcs1_md5_sign(&self.private, rng, message)
    }

    /// Returns `true` if `signature` is valid for `message`.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        pkcs1_md5_verify(&self.public, message, signature)
    }

    /// Log-safe fingerprint of the public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("SigningIdentity")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

// ============================================
// SessionIdentity
// ============================================

/// RSA-1024 session key with its signed public key record.
pub struct SessionIdentity {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    record: PublicKeyRecord,
}

impl SessionIdentity {
    /// Generates a session key and signs its record with `signing`.
    ///
    /// # Errors
    /// Returns `KeyGeneration` or `SignatureCreation` on failure.
    pub fn generate<R>(signing: &SigningIdentity, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let private = generate_key(rng, SESSION_KEY_BITS)?;
        let public = RsaPublicKey::from(&private);
        let record = PublicKeyRecord::build(&public, signing, rng)?;
        Ok(Self {
            private,
            public,
            record,
        })
    }

    /// Parses a session private key from PKCS#1 DER.
    ///
    /// # Errors
    /// Returns `MalformedPrivateKey` if the DER does not parse.
    pub fn parse_private_der(der: &[u8]) -> std::result::Result<RsaPrivateKey, IntegrityFailure> {
        parse_private_der(der)
    }

    /// Pairs a private key with a record that has already been verified.
    pub(crate) fn from_verified(private: RsaPrivateKey, record: PublicKeyRecord) -> Self {
        let public = RsaPublicKey::from(&private);
        Self {
            private,
            public,
            record,
        }
    }

    /// Exports the private key as PKCS#1 DER.
    ///
    /// # Errors
    /// Returns `KeyGeneration` if encoding fails.
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        export_private_der(&self.private, "session")
    }

    /// Returns the public half.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Returns the signed record.
    #[must_use]
    pub fn record(&self) -> &PublicKeyRecord {
        &self.record
    }

    /// Cached wire bytes of the signed record.
    #[must_use]
    pub fn public_key_record(&self) -> &[u8] {
        self.record.as_bytes()
    }

    /// Log-safe fingerprint of the public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("fingerprint", &self.fingerprint())
            .field("record_len", &self.record.as_bytes().len())
            .finish_non_exhaustive()
    }
}

// ============================================
// ServerKeys
// ============================================

/// Both identities, as produced by `KeyStore::bootstrap`.
#[derive(Debug)]
pub struct ServerKeys {
    signing: SigningIdentity,
    session: SessionIdentity,
}

impl ServerKeys {
    /// Bundles a signing and session identity.
    #[must_use]
    pub fn new(signing: SigningIdentity, session: SessionIdentity) -> Self {
        Self { signing, session }
    }

    /// Returns the signing identity.
    #[must_use]
    pub fn signing(&self) -> &SigningIdentity {
        &self.signing
    }

    /// Returns the session identity.
    #[must_use]
    pub fn session(&self) -> &SessionIdentity {
        &self.session
    }

    /// Cached wire bytes of the session record.
    #[must_use]
    pub fn public_key_record(&self) -> &[u8] {
        self.session.public_key_record()
    }
}

// ============================================
// Test Fixtures
// ============================================

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::OnceLock;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::SigningIdentity;

    /// Seeded RNG for reproducible tests.
    pub fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Signing identity shared by every test in the crate.
    ///
    /// 2048-bit generation is the slow part of the suite, so it runs once.
    pub fn signing() -> &'static SigningIdentity {
        static SIGNING: OnceLock<SigningIdentity> = OnceLock::new();
        SIGNING.get_or_init(|| SigningIdentity::generate(&mut rng(0x5167)).unwrap())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::fixtures::{rng, signing};
    use super::*;

    #[test]
    fn test_signing_modulus_is_256_bytes() {
        let signing = signing();
        assert_eq!(signing.modulus_bytes().len(), SIGNING_MODULUS_LEN);
        assert_eq!(signing.signature_len(), SIGNING_MODULUS_LEN);
        assert_eq!(signing.public_key().e(), &BigUint::from(PUBLIC_EXPONENT));
    }

    #[test]
    fn test_signing_der_roundtrip() {
        let signing = signing();
        let der = signing.to_der().unwrap();
        let loaded = SigningIdentity::from_der(&der).unwrap();
        assert_eq!(loaded.modulus_bytes(), signing.modulus_bytes());
        assert_eq!(loaded.fingerprint(), signing.fingerprint());
    }

    #[test]
    fn test_signing_rejects_wrong_size() {
        let session = SessionIdentity::generate(signing(), &mut rng(1)).unwrap();
        let der = session.to_der().unwrap();

        let err = SigningIdentity::from_der(&der).unwrap_err();
        assert_eq!(
            err,
            IntegrityFailure::KeySize {
                expected: 256,
                actual: 128
            }
        );
    }

    #[test]
    fn test_signing_rejects_garbage() {
        let err = SigningIdentity::from_der(&[0x30, 0x03, 0x02, 0x01]).unwrap_err();
        assert!(matches!(err, IntegrityFailure::MalformedPrivateKey(_)));
    }

    #[test]
    fn test_sign_verify() {
        let signing = signing();
        let mut rng = rng(2);
        let signature = signing.sign(&mut rng, b"payload").unwrap();
        assert_eq!(signature.len(), 256);
        assert!(signing.verify(b"payload", &signature));
        assert!(!signing.verify(b"payloaD", &signature));

        let mut tampered = signature.clone();
        tampered[10] ^= 0x01;
        assert!(!signing.verify(b"payload", &tampered));
    }

    #[test]
    fn test_session_identity() {
        let session = SessionIdentity::generate(signing(), &mut rng(3)).unwrap();
        assert_eq!(session.public_key().size(), 128);
        assert_eq!(session.public_key().e(), &BigUint::from(PUBLIC_EXPONENT));
        assert_eq!(session.public_key_record(), session.record().as_bytes());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let signing = signing();
        let debug = format!("{signing:?}");
        assert!(debug.contains(&signing.fingerprint()));
        assert!(!debug.contains("private"));
        assert_eq!(signing.fingerprint().len(), 16);
    }
}
