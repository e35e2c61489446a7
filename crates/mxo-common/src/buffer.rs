// ============================================
// File: crates/mxo-common/src/buffer.rs
// ============================================
//! # Byte Buffer
//!
//! ## Creation Reason
//! Every wire structure in the auth protocol (ordered packets, key
//! records, command payloads) is assembled and parsed through one
//! cursor-based buffer so bounds checks live in exactly one place.
//!
//! ## Main Functionality
//! - `ByteBuffer`: growable bytes with independent read/write cursors
//! - `ByteOrder`: per-field byte order selector
//! - Bounds-checked scalar and blob reads returning `TruncatedInput`
//!
//! ## Cursor Model
//! ```text
//!  0                rpos            wpos          size
//!  ├─────────────────┼───────────────┼─────────────┤
//!  │   already read  │  remaining()  │             │
//!  └─────────────────┴───────────────┴─────────────┘
//!  remaining() = size - rpos
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The protocol is NOT uniformly big- or little-endian. Every integer
//!   read or write names its byte order explicitly; do not add
//!   "default endian" helpers.
//! - Reads never panic. A short buffer is a `TruncatedInput` error.
//!
//! ## Last Modified
//! v0.1.0 - Initial cursor buffer

use std::fmt;

use bytes::Bytes;

use crate::error::{CommonError, Result};

// ============================================
// ByteOrder
// ============================================

/// Byte order of a single wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

// ============================================
// ByteBuffer
// ============================================

/// Growable byte buffer with independent read and write positions.
///
/// # Example
/// ```
/// use mxo_common::buffer::{ByteBuffer, ByteOrder};
///
/// let mut buf = ByteBuffer::new();
/// buf.write_u16(0x0001, ByteOrder::Big);
/// buf.write_u8(0x02);
///
/// assert_eq!(buf.contents(), &[0x00, 0x01, 0x02]);
/// assert_eq!(buf.read_u16(ByteOrder::Big).unwrap(), 1);
/// assert_eq!(buf.remaining(), 1);
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    rpos: usize,
    wpos: usize,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            rpos: 0,
            wpos: 0,
        }
    }

    /// Creates an empty buffer with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            rpos: 0,
            wpos: 0,
        }
    }

    /// Wraps existing bytes for reading.
    ///
    /// The read position starts at 0 and the write position at the end,
    /// so further writes append.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        let wpos = data.len();
        Self { data, rpos: 0, wpos }
    }

    // ========================================
    // Positions
    // ========================================

    /// Total number of bytes held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the read position and the end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.rpos
    }

    /// Current read position.
    #[must_use]
    pub const fn rpos(&self) -> usize {
        self.rpos
    }

    /// Current write position.
    #[must_use]
    pub const fn wpos(&self) -> usize {
        self.wpos
    }

    /// Moves the read position, clamped to the buffer size.
    pub fn set_rpos(&mut self, pos: usize) {
        self.rpos = pos.min(self.data.len());
    }

    /// Moves the write position.
    ///
    /// Positions past the end are allowed; the gap is zero-filled on the
    /// next write.
    pub fn set_wpos(&mut self, pos: usize) {
        self.wpos = pos;
    }

    /// Whole contents regardless of cursors.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Unread part of the buffer.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.rpos..]
    }

    /// Drops all bytes and resets both cursors.
    pub fn clear(&mut self) {
        self.data.clear();
        self.rpos = 0;
        self.wpos = 0;
    }

    /// Consumes the buffer, returning the raw bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Consumes the buffer into immutable `Bytes`.
    #[must_use]
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.data)
    }

    // ========================================
    // Writes
    // ========================================

    /// Writes raw bytes at the write position, growing as needed.
    pub fn append(&mut self, bytes: &[u8]) {
        let end = self.wpos + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.wpos..end].copy_from_slice(bytes);
        self.wpos = end;
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.append(&[value]);
    }

    /// Writes a `u16` in the given byte order.
    pub fn write_u16(&mut self, value: u16, order: ByteOrder) {
        match order {
            ByteOrder::Big => self.append(&value.to_be_bytes()),
            ByteOrder::Little => self.append(&value.to_le_bytes()),
        }
    }

    /// Writes a `u32` in the given byte order.
    pub fn write_u32(&mut self, value: u32, order: ByteOrder) {
        match order {
            ByteOrder::Big => self.append(&value.to_be_bytes()),
            ByteOrder::Little => self.append(&value.to_le_bytes()),
        }
    }

    /// Writes a `u64` in the given byte order.
    pub fn write_u64(&mut self, value: u64, order: ByteOrder) {
        match order {
            ByteOrder::Big => self.append(&value.to_be_bytes()),
            ByteOrder::Little => self.append(&value.to_le_bytes()),
        }
    }

    // ========================================
    // Reads
    // ========================================

    /// Borrows the next `len` bytes and advances the read position.
    ///
    /// # Errors
    /// Returns `TruncatedInput` if fewer than `len` bytes remain. The read
    /// position is left untouched in that case.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let available = self.remaining();
        if len > available {
            return Err(CommonError::truncated(len, available));
        }
        let start = self.rpos;
        self.rpos += len;
        Ok(&self.data[start..self.rpos])
    }

    /// Fills `out` from the buffer.
    ///
    /// # Errors
    /// Returns `TruncatedInput` if fewer than `out.len()` bytes remain.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Reads one byte.
    ///
    /// # Errors
    /// Returns `TruncatedInput` on an exhausted buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Reads a `u16` in the given byte order.
    ///
    /// # Errors
    /// Returns `TruncatedInput` if fewer than 2 bytes remain.
    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16> {
        let raw = self.read_array::<2>()?;
        Ok(match order {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        })
    }

    /// Reads a `u32` in the given byte order.
    ///
    /// # Errors
    /// Returns `TruncatedInput` if fewer than 4 bytes remain.
    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let raw = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        })
    }

    /// Reads a `u64` in the given byte order.
    ///
    /// # Errors
    /// Returns `TruncatedInput` if fewer than 8 bytes remain.
    pub fn read_u64(&mut self, order: ByteOrder) -> Result<u64> {
        let raw = self.read_array::<8>()?;
        Ok(match order {
            ByteOrder::Big => u64::from_be_bytes(raw),
            ByteOrder::Little => u64::from_le_bytes(raw),
        })
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(data: Bytes) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("size", &self.data.len())
            .field("rpos", &self.rpos)
            .field("wpos", &self.wpos)
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mixed_byte_order_fields() {
        let mut buf = ByteBuffer::new();
        buf.write_u16(0x060E, ByteOrder::Big);
        buf.write_u32(2, ByteOrder::Little);
        buf.write_u32(0xD868_C847, ByteOrder::Big);

        assert_eq!(
            buf.contents(),
            &[0x06, 0x0E, 0x02, 0x00, 0x00, 0x00, 0xD8, 0x68, 0xC8, 0x47]
        );

        assert_eq!(buf.read_u16(ByteOrder::Big).unwrap(), 0x060E);
        assert_eq!(buf.read_u32(ByteOrder::Little).unwrap(), 2);
        assert_eq!(buf.read_u32(ByteOrder::Big).unwrap(), 0xD868_C847);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_fails_without_advancing() {
        let mut buf = ByteBuffer::from_vec(vec![0x01]);

        let err = buf.read_u16(ByteOrder::Big).unwrap_err();
        assert!(matches!(
            err,
            CommonError::TruncatedInput { needed: 2, available: 1 }
        ));
        assert_eq!(buf.rpos(), 0);
        assert_eq!(buf.read_u8().unwrap(), 0x01);
        assert!(buf.read_u8().is_err());
    }

    #[test]
    fn test_read_bytes_bounds() {
        let mut buf = ByteBuffer::from_vec(vec![1, 2, 3]);
        assert_eq!(buf.read_bytes(2).unwrap(), &[1, 2]);
        assert!(buf.read_bytes(2).is_err());
        assert_eq!(buf.read_bytes(1).unwrap(), &[3]);
        assert_eq!(buf.read_bytes(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_write_past_end_zero_fills() {
        let mut buf = ByteBuffer::new();
        buf.set_wpos(2);
        buf.write_u8(0xFF);
        assert_eq!(buf.contents(), &[0, 0, 0xFF]);
        assert_eq!(buf.wpos(), 3);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut buf = ByteBuffer::from_vec(vec![0xAA, 0xBB, 0xCC]);
        buf.set_wpos(1);
        buf.write_u8(0x00);
        assert_eq!(buf.contents(), &[0xAA, 0x00, 0xCC]);
    }

    #[test]
    fn test_rpos_is_clamped() {
        let mut buf = ByteBuffer::from_vec(vec![1, 2]);
        buf.set_rpos(10);
        assert_eq!(buf.rpos(), 2);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_clear_resets_cursors() {
        let mut buf = ByteBuffer::from_vec(vec![1, 2, 3]);
        buf.read_u8().unwrap();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.rpos(), 0);
        assert_eq!(buf.wpos(), 0);
    }

    proptest! {
        #[test]
        fn prop_scalar_reads_match_writes(
            a in any::<u16>(),
            b in any::<u32>(),
            c in any::<u64>(),
            big in any::<bool>(),
        ) {
            let order = if big { ByteOrder::Big } else { ByteOrder::Little };
            let mut buf = ByteBuffer::new();
            buf.write_u16(a, order);
            buf.write_u32(b, order);
            buf.write_u64(c, order);

            prop_assert_eq!(buf.size(), 14);
            prop_assert_eq!(buf.read_u16(order).unwrap(), a);
            prop_assert_eq!(buf.read_u32(order).unwrap(), b);
            prop_assert_eq!(buf.read_u64(order).unwrap(), c);
            prop_assert_eq!(buf.remaining(), 0);
        }
    }
}
