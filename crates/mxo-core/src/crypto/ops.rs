// ============================================
// File: crates/mxo-core/src/crypto/ops.rs
// ============================================
//! # Crypto Operations
//!
//! ## Creation Reason
//! The operations the login flow performs with the session key, behind a
//! trait so handlers can be tested without real RSA keys.
//!
//! ## Main Functionality
//! - `CryptoOps`: encrypt/decrypt/sign/verify and the public key responses
//! - `RsaCryptoOps`: implementation over bootstrapped `ServerKeys`
//! - `build_public_key_record`: signs a session public key
//!
//! ## Schemes
//! ```text
//! encrypt / decrypt : RSAES-OAEP, SHA-1, session key (blinded decrypt)
//! sign / verify     : RSASSA-PKCS1-v1_5, MD5, session key
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Decryption failures collapse into a single `Decryption` error
//! - OAEP-SHA1 on a 1024-bit key carries at most 86 bytes of plaintext
//!
//! ## Last Modified
//! v0.1.0 - Initial RSA operations

use std::sync::Arc;

use bytes::Bytes;
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use tracing::trace;

use super::keys::{pkcs1_md5_sign, pkcs1_md5_verify, ServerKeys, SigningIdentity};
use super::record::PublicKeyRecord;
use super::SHA1_DIGEST_LEN;
use crate::error::{CoreError, Result};

// ============================================
// CryptoOps Trait
// ============================================

/// RSA operations available to the login flow.
pub trait CryptoOps: Send + Sync {
    /// Encrypts `plaintext` to the session public key.
    ///
    /// # Errors
    /// Returns `Encryption` if the plaintext is too long.
    fn encrypt<R>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng;

    /// Decrypts `ciphertext` with the session private key.
    ///
    /// # Errors
    /// Returns `Decryption` on any failure; no partial output.
    fn decrypt<R>(&self, rng: &mut R, ciphertext: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng;

    /// Signs `message` with the session private key.
    ///
    /// # Errors
    /// Returns `SignatureCreation` on failure.
    fn sign<R>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng;

    /// Returns `true` if `signature` is a session-key signature of `message`.
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;

    /// The signed session public key record.
    fn public_key_record(&self) -> &PublicKeyRecord;

    /// GetPubKeyData response bytes.
    fn pub_key_data(&self) -> Bytes {
        self.public_key_record().pub_key_data()
    }
}

/// Builds and signs a `PublicKeyRecord` for `session_public`.
///
/// # Errors
/// Returns `SignatureCreation` if signing fails.
pub fn build_public_key_record<R>(
    session_public: &RsaPublicKey,
    signing: &SigningIdentity,
    rng: &mut R,
) -> Result<PublicKeyRecord>
where
    R: RngCore + CryptoRng,
{
    PublicKeyRecord::build(session_public, signing, rng)
}

// ============================================
// RsaCryptoOps
// ============================================

/// `CryptoOps` over the bootstrapped server keys.
#[derive(Debug, Clone)]
pub struct RsaCryptoOps {
    keys: Arc<ServerKeys>,
}

impl RsaCryptoOps {
    /// Wraps shared server keys.
    #[must_use]
    pub fn new(keys: Arc<ServerKeys>) -> Self {
        Self { keys }
    }

    /// Returns the underlying keys.
    #[must_use]
    pub fn keys(&self) -> &ServerKeys {
        &self.keys
    }

    /// Longest plaintext `encrypt` accepts.
    #[must_use]
    pub fn max_plaintext_len(&self) -> usize {
        self.keys
            .session()
            .public_key()
            .size()
            .saturating_sub(2 * SHA1_DIGEST_LEN + 2)
    }
}

impl From<ServerKeys> for RsaCryptoOps {
    fn from(keys: ServerKeys) -> Self {
        Self::new(Arc::new(keys))
    }
}

impl CryptoOps for RsaCryptoOps {
    fn encrypt<R>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng,
    {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(CoreError::encryption(format!(
                "plaintext is {} bytes, limit {max}",
                plaintext.len()
            )));
        }
        self.keys
            .session()
            .public_key()
            .encrypt(rng, Oaep::new::<Sha1>(), plaintext)
            .map_err(|e| CoreError::encryption(e.to_string()))
    }

    fn decrypt<R>(&self, rng: &mut R, ciphertext: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng,
    {
        self.keys
            .session()
            .private_key()
            .decrypt_blinded(rng, Oaep::new::<Sha1>(), ciphertext)
            .map_err(|e| {
                trace!(error = %e, len = ciphertext.len(), "Decryption rejected");
                CoreError::Decryption
            })
    }

    fn sign<R>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>>
    where
        R: RngCore + CryptoRng,
    {
        pkcs1_md5_sign(self.keys.session().private_key(), rng, message)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        pkcs1_md5_verify(self.keys.session().public_key(), message, signature)
    }

    fn public_key_record(&self) -> &PublicKeyRecord {
        self.keys.session().record()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::fixtures::{rng, signing};
    use crate::crypto::SessionIdentity;

    fn ops() -> RsaCryptoOps {
        let signing_der = signing().to_der().unwrap();
        let signing = SigningIdentity::from_der(&signing_der).unwrap();
        let session = SessionIdentity::generate(&signing, &mut rng(30)).unwrap();
        RsaCryptoOps::from(ServerKeys::new(signing, session))
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let ops = ops();
        let mut rng = rng(31);

        let ciphertext = ops.encrypt(&mut rng, b"session secret").unwrap();
        assert_eq!(ciphertext.len(), 128);
        assert_eq!(ops.decrypt(&mut rng, &ciphertext).unwrap(), b"session secret");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let ops = ops();
        let mut rng = rng(32);

        let mut ciphertext = ops.encrypt(&mut rng, b"secret").unwrap();
        ciphertext[64] ^= 0x80;
        assert!(matches!(
            ops.decrypt(&mut rng, &ciphertext),
            Err(CoreError::Decryption)
        ));
        assert!(matches!(
            ops.decrypt(&mut rng, &ciphertext[..10]),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn test_plaintext_limit() {
        let ops = ops();
        let mut rng = rng(33);

        assert_eq!(ops.max_plaintext_len(), 86);
        assert!(ops.encrypt(&mut rng, &[0x41; 86]).is_ok());
        assert!(matches!(
            ops.encrypt(&mut rng, &[0x41; 87]),
            Err(CoreError::Encryption { .. })
        ));
    }

    #[test]
    fn test_sign_verify_tamper() {
        let ops = ops();
        let mut rng = rng(34);

        let signature = ops.sign(&mut rng, b"login").unwrap();
        assert_eq!(signature.len(), 128);
        assert!(ops.verify(b"login", &signature));
        assert!(!ops.verify(b"logout", &signature));

        let mut tampered = signature.clone();
        tampered[0] ^= 0x01;
        assert!(!ops.verify(b"login", &tampered));
        assert!(!ops.verify(b"login", &signature[..127]));
    }

    #[test]
    fn test_record_and_pub_key_data() {
        let ops = ops();
        let record = ops.public_key_record();
        assert_eq!(record.as_bytes(), ops.keys().public_key_record());

        let data = ops.pub_key_data();
        assert_eq!(&data[..2], &[128, 0]);

        let rebuilt = build_public_key_record(
            ops.keys().session().public_key(),
            ops.keys().signing(),
            &mut rng(35),
        )
        .unwrap();
        assert_eq!(&rebuilt, record);
    }
}
