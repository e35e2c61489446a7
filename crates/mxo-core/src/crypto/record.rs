// ============================================
// File: crates/mxo-core/src/crypto/record.rs
// ============================================
//! # Public Key Record
//!
//! ## Creation Reason
//! Clients receive the session public key inside a record signed by the
//! signing identity. The same bytes are persisted as `pubkey.dat` and
//! checked on every startup.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────┬───────────────────┬────────────────────┬─────┬───────────┐
//! │ tag u32 BE=4 │ DER INTEGER n     │ DER INTEGER e      │ 0x00│ signature │
//! └──────────────┴───────────────────┴────────────────────┴─────┴───────────┘
//!                                                              (last 256 B)
//! signature = PKCS1v15-MD5(signing_key, minimal(n) ‖ minimal(e))
//! ```
//!
//! ## GetPubKeyData Format
//! ```text
//! ┌──────────────┬─────────┬──────────────┬───────────┐
//! │ modLen u16 LE│ modulus │ sigLen u16 LE│ signature │
//! └──────────────┴─────────┴──────────────┴───────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `parse` only checks structure; call `verify_against` before trusting
//!   a record loaded from disk
//! - The signature is located from the END of the record, so the DER
//!   region must be consumed exactly
//!
//! ## Last Modified
//! v0.1.0 - Initial record format

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::der::asn1::UintRef;
use rsa::pkcs1::der::{Decode, Encode, Reader, SliceReader};
use rsa::RsaPublicKey;

use mxo_common::ByteBuffer;

use super::keys::{exponent_bytes, modulus_bytes, SigningIdentity};
use super::{FORMAT_TAG, RECORD_SEPARATOR};
use crate::error::{CoreError, IntegrityFailure, Result};
use crate::protocol::wire::{FORMAT_TAG_ORDER, PUB_KEY_DATA_LENGTH_ORDER};

const FORMAT_TAG_LEN: usize = 4;

// ============================================
// PublicKeyRecord
// ============================================

/// Signed session public key, with its encoded form cached.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyRecord {
    /// Minimal big-endian modulus
    modulus: Vec<u8>,
    /// Minimal big-endian exponent
    exponent: Vec<u8>,
    /// Signature by the signing identity
    signature: Vec<u8>,
    /// Full wire encoding
    encoded: Bytes,
}

impl PublicKeyRecord {
    /// Message the signing identity signs for a given key.
    #[must_use]
    pub fn signed_message(modulus: &[u8], exponent: &[u8]) -> Vec<u8> {
        let mut message = Vec::with_capacity(modulus.len() + exponent.len());
        message.extend_from_slice(modulus);
        message.extend_from_slice(exponent);
        message
    }

    /// Builds and signs a record for `session_public`.
    ///
    /// PKCS#1 v1.5 signatures are deterministic, so the same key pair
    /// always yields the same bytes.
    ///
    /// # Errors
    /// Returns `SignatureCreation` if signing fails, or `KeyGeneration` if
    /// the key material cannot be DER-encoded.
    pub fn build<R>(
        session_public: &RsaPublicKey,
        signing: &SigningIdentity,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let modulus = modulus_bytes(session_public);
        let exponent = exponent_bytes(session_public);
        let signature = signing.sign(rng, &Self::signed_message(&modulus, &exponent))?;

        let encoded = encode(&modulus, &exponent, &signature)?;
        Ok(Self {
            modulus,
            exponent,
            signature,
            encoded,
        })
    }

    /// Parses the structure of a record whose signature is `signature_len`
    /// bytes long.
    ///
    /// # Errors
    /// - `FormatTag` if the tag is not 4
    /// - `Truncated` if the fixed parts do not fit
    /// - `Separator` if the byte before the signature is not 0
    /// - `MalformedDer` if the key material is not exactly two DER integers
    pub fn parse(bytes: &[u8], signature_len: usize) -> std::result::Result<Self, IntegrityFailure> {
        let mut buf = ByteBuffer::from(bytes);
        let tag = buf
            .read_u32(FORMAT_TAG_ORDER)
            .map_err(|_| IntegrityFailure::Truncated)?;
        if tag != FORMAT_TAG {
            return Err(IntegrityFailure::FormatTag(tag));
        }

        // tag, at least one DER byte, separator, signature
        if bytes.len() < FORMAT_TAG_LEN + 1 + 1 + signature_len {
            return Err(IntegrityFailure::Truncated);
        }
        let signature_start = bytes.len() - signature_len;
        let separator = bytes[signature_start - 1];
        if separator != RECORD_SEPARATOR {
            return Err(IntegrityFailure::Separator(separator));
        }

        let der = &bytes[FORMAT_TAG_LEN..signature_start - 1];
        let (modulus, exponent) = decode_key_material(der)?;

        Ok(Self {
            modulus,
            exponent,
            signature: bytes[signature_start..].to_vec(),
            encoded: Bytes::copy_from_slice(bytes),
        })
    }

    /// Checks that this record describes `session_public` and carries a
    /// valid signature by `signing`.
    ///
    /// # Errors
    /// - `KeyMismatch` if modulus or exponent differ
    /// - `BadSignature` if the signature does not verify
    pub fn verify_against(
        &self,
        session_public: &RsaPublicKey,
        signing: &SigningIdentity,
    ) -> std::result::Result<(), IntegrityFailure> {
        if !self.matches_key(session_public) {
            return Err(IntegrityFailure::KeyMismatch);
        }
        let message = Self::signed_message(&self.modulus, &self.exponent);
        if !signing.verify(&message, &self.signature) {
            return Err(IntegrityFailure::BadSignature);
        }
        Ok(())
    }

    /// Returns `true` if modulus and exponent equal those of `public`.
    #[must_use]
    pub fn matches_key(&self, public: &RsaPublicKey) -> bool {
        self.modulus == modulus_bytes(public) && self.exponent == exponent_bytes(public)
    }

    /// Minimal modulus bytes.
    #[must_use]
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// Minimal exponent bytes.
    #[must_use]
    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    /// Signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Full wire encoding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// Cheap clone of the wire encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        self.encoded.clone()
    }

    /// Builds the GetPubKeyData response.
    #[must_use]
    pub fn pub_key_data(&self) -> Bytes {
        let mut buf = ByteBuffer::with_capacity(4 + self.modulus.len() + self.signature.len());
        // Both lengths are bounded by the key sizes (128 and 256 bytes)
        write_prefixed(&mut buf, &self.modulus);
        write_prefixed(&mut buf, &self.signature);
        buf.freeze()
    }
}

impl fmt::Debug for PublicKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyRecord")
            .field("modulus_len", &self.modulus.len())
            .field("exponent", &hex::encode(&self.exponent))
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

impl fmt::Display for PublicKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(&self.encoded))
    }
}

// ============================================
// Encoding Helpers
// ============================================

fn encode(modulus: &[u8], exponent: &[u8], signature: &[u8]) -> Result<Bytes> {
    let der_error = |e: rsa::pkcs1::der::Error| CoreError::key_generation(format!("DER encode: {e}"));
    let modulus_der = UintRef::new(modulus).and_then(|n| n.to_der()).map_err(der_error)?;
    let exponent_der = UintRef::new(exponent).and_then(|e| e.to_der()).map_err(der_error)?;

    let mut buf = ByteBuffer::with_capacity(
        FORMAT_TAG_LEN + modulus_der.len() + exponent_der.len() + 1 + signature.len(),
    );
    buf.write_u32(FORMAT_TAG, FORMAT_TAG_ORDER);
    buf.append(&modulus_der);
    buf.append(&exponent_der);
    buf.write_u8(RECORD_SEPARATOR);
    buf.append(signature);
    Ok(buf.freeze())
}

fn decode_key_material(der: &[u8]) -> std::result::Result<(Vec<u8>, Vec<u8>), IntegrityFailure> {
    let malformed = |e: rsa::pkcs1::der::Error| IntegrityFailure::MalformedDer(e.to_string());

    let mut reader = SliceReader::new(der).map_err(malformed)?;
    let modulus = UintRef::decode(&mut reader).map_err(malformed)?;
    let exponent = UintRef::decode(&mut reader).map_err(malformed)?;
    if !reader.is_finished() {
        return Err(IntegrityFailure::MalformedDer(
            "unexpected bytes after exponent".to_string(),
        ));
    }
    Ok((modulus.as_bytes().to_vec(), exponent.as_bytes().to_vec()))
}

fn write_prefixed(buf: &mut ByteBuffer, data: &[u8]) {
    let len = u16::try_from(data.len()).unwrap_or(u16::MAX);
    buf.write_u16(len, PUB_KEY_DATA_LENGTH_ORDER);
    buf.append(data);
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use rsa::traits::PublicKeyParts;

    use super::*;
    use crate::crypto::keys::fixtures::{rng, signing};
    use crate::crypto::SessionIdentity;

    fn session() -> SessionIdentity {
        SessionIdentity::generate(signing(), &mut rng(10)).unwrap()
    }

    #[test]
    fn test_record_layout() {
        let session = session();
        let record = session.record();
        let bytes = record.as_bytes();

        assert_eq!(&bytes[..4], &[0, 0, 0, 4]);
        // 1024-bit modulus has its top bit set, so DER adds a 0x00 pad
        assert_eq!(&bytes[4..8], &[0x02, 0x81, 0x81, 0x00]);
        assert_eq!(&bytes[4 + 4 + 128..4 + 4 + 128 + 3], &[0x02, 0x01, 0x11]);
        assert_eq!(bytes[4 + 4 + 128 + 3], 0x00);
        assert_eq!(bytes.len(), 4 + 132 + 3 + 1 + 256);
        assert_eq!(&bytes[bytes.len() - 256..], record.signature());
    }

    #[test]
    fn test_signature_covers_raw_key() {
        let session = session();
        let record = session.record();
        let public = session.public_key();

        let raw = PublicKeyRecord::signed_message(&public.n().to_bytes_be(), &public.e().to_bytes_be());
        assert!(signing().verify(&raw, record.signature()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let session = session();
        let again = PublicKeyRecord::build(session.public_key(), signing(), &mut rng(99)).unwrap();
        assert_eq!(again.as_bytes(), session.record().as_bytes());
    }

    #[test]
    fn test_parse_roundtrip_and_verify() {
        let session = session();
        let parsed = PublicKeyRecord::parse(session.public_key_record(), 256).unwrap();
        assert_eq!(&parsed, session.record());
        assert!(parsed.verify_against(session.public_key(), signing()).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_tag() {
        let session = session();
        let mut bytes = session.public_key_record().to_vec();
        bytes[3] = 5;
        assert_eq!(
            PublicKeyRecord::parse(&bytes, 256).unwrap_err(),
            IntegrityFailure::FormatTag(5)
        );
    }

    #[test]
    fn test_parse_rejects_bad_separator() {
        let session = session();
        let mut bytes = session.public_key_record().to_vec();
        let sep = bytes.len() - 257;
        bytes[sep] = 0x01;
        assert_eq!(
            PublicKeyRecord::parse(&bytes, 256).unwrap_err(),
            IntegrityFailure::Separator(0x01)
        );
    }

    #[test]
    fn test_parse_rejects_truncated() {
        assert_eq!(
            PublicKeyRecord::parse(&[0, 0], 256).unwrap_err(),
            IntegrityFailure::Truncated
        );
        assert_eq!(
            PublicKeyRecord::parse(&[0, 0, 0, 4, 0], 256).unwrap_err(),
            IntegrityFailure::Truncated
        );
    }

    #[test]
    fn test_parse_rejects_trailing_der() {
        let session = session();
        let bytes = session.public_key_record();
        let sig_start = bytes.len() - 256;

        let mut padded = bytes[..sig_start - 1].to_vec();
        padded.push(0x05);
        padded.extend_from_slice(&bytes[sig_start - 1..]);
        assert!(matches!(
            PublicKeyRecord::parse(&padded, 256).unwrap_err(),
            IntegrityFailure::MalformedDer(_)
        ));
    }

    #[test]
    fn test_flipped_signature_bit_fails_verification() {
        let session = session();
        let mut bytes = session.public_key_record().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let parsed = PublicKeyRecord::parse(&bytes, 256).unwrap();
        assert_eq!(
            parsed.verify_against(session.public_key(), signing()),
            Err(IntegrityFailure::BadSignature)
        );
    }

    #[test]
    fn test_other_key_is_mismatch() {
        let session = session();
        let other = SessionIdentity::generate(signing(), &mut rng(11)).unwrap();
        assert_eq!(
            session.record().verify_against(other.public_key(), signing()),
            Err(IntegrityFailure::KeyMismatch)
        );
    }

    #[test]
    fn test_pub_key_data_layout() {
        let session = session();
        let record = session.record();
        let data = record.pub_key_data();

        assert_eq!(&data[..2], &[128, 0]);
        assert_eq!(&data[2..130], record.modulus());
        assert_eq!(&data[130..132], &[0x00, 0x01]);
        assert_eq!(&data[132..], record.signature());
    }
}
