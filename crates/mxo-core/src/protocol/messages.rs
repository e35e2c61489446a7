// ============================================
// File: crates/mxo-core/src/protocol/messages.rs
// ============================================
//! # Ordered Packet Structures
//!
//! ## Creation Reason
//! Defines the typed, size-bounded values that the ordered-packet codec
//! reads and writes.
//!
//! ## Main Functionality
//! - `SubPacket`: one payload, 1..=255 bytes
//! - `MsgBlock`: sequence id plus up to 255 sub-packets
//! - `OrderedPacket`: opcode 0x04 envelope of 1..=255 blocks
//!
//! ## Nesting
//! ```text
//! OrderedPacket
//! ├─ MsgBlock (seq 1)
//! │  ├─ SubPacket [..]
//! │  └─ SubPacket [..]
//! └─ MsgBlock (seq 2)
//!    └─ SubPacket [..]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every bound is enforced at construction. A value that exists can
//!   always be encoded without truncating a count or length byte.
//! - Worst case decode allocation: 255 blocks x 255 sub-packets x 255
//!   bytes. Keep these types the only way to build packets.
//!
//! ## Last Modified
//! v0.1.0 - Initial ordered packet definitions

use bytes::Bytes;

use crate::error::{CoreError, FramingViolation, Result};
use crate::protocol::wire::MAX_U8_COUNT;

// ============================================
// Constants
// ============================================

/// Largest payload a sub-packet may carry.
pub const MAX_SUB_PACKET_LEN: usize = MAX_U8_COUNT;

/// Most sub-packets one block may carry.
pub const MAX_SUB_PACKETS: usize = MAX_U8_COUNT;

/// Most blocks one ordered packet may carry.
pub const MAX_BLOCKS: usize = MAX_U8_COUNT;

/// Encoded size of a block header (sequence id + count).
pub const MSG_BLOCK_HEADER_SIZE: usize = 3;

/// Encoded size of an ordered packet header (opcode + count).
pub const ORDERED_PACKET_HEADER_SIZE: usize = 2;

// ============================================
// SubPacket
// ============================================

/// A single length-prefixed payload inside a [`MsgBlock`].
///
/// Always 1..=255 bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubPacket(Bytes);

impl SubPacket {
    /// Wraps a payload.
    ///
    /// # Errors
    /// - `EmptySubPacket` if the payload is empty
    /// - `LimitExceeded` if it is longer than 255 bytes
    pub fn new(payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(FramingViolation::EmptySubPacket.into());
        }
        if payload.len() > MAX_SUB_PACKET_LEN {
            return Err(CoreError::limit_exceeded(
                "sub-packet byte",
                MAX_SUB_PACKET_LEN,
                payload.len(),
            ));
        }
        Ok(Self(payload))
    }

    /// Payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length as written on the wire.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn wire_len(&self) -> u8 {
        // Bounded to 1..=255 by `new`.
        self.0.len() as u8
    }

    /// Payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed sub-packet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the payload.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl TryFrom<Vec<u8>> for SubPacket {
    type Error = CoreError;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&[u8]> for SubPacket {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::new(Bytes::copy_from_slice(value))
    }
}

impl AsRef<[u8]> for SubPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// MsgBlock
// ============================================

/// One sequenced unit of up to 255 sub-packets.
///
/// # Wire Format
/// ```text
/// ┌──────────────────┬─────────┬───────────────────────────┐
/// │ sequence_id (u16 │ count   │ count x (len u8, payload) │
/// │ big-endian)      │ (u8)    │                           │
/// └──────────────────┴─────────┴───────────────────────────┘
/// ```
///
/// # Example
/// ```
/// use mxo_core::protocol::{MsgBlock, SubPacket};
///
/// let block = MsgBlock::new(1, vec![SubPacket::new(vec![0xAAu8, 0xBB]).unwrap()]).unwrap();
/// assert_eq!(block.sequence_id(), 1);
/// assert_eq!(block.encoded_len(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MsgBlock {
    sequence_id: u16,
    sub_packets: Vec<SubPacket>,
}

impl MsgBlock {
    /// Creates a block from its sub-packets.
    ///
    /// # Errors
    /// Returns `LimitExceeded` for more than 255 sub-packets.
    pub fn new(sequence_id: u16, sub_packets: Vec<SubPacket>) -> Result<Self> {
        if sub_packets.len() > MAX_SUB_PACKETS {
            return Err(CoreError::limit_exceeded(
                "sub-packet",
                MAX_SUB_PACKETS,
                sub_packets.len(),
            ));
        }
        Ok(Self {
            sequence_id,
            sub_packets,
        })
    }

    /// Creates a block with no sub-packets.
    #[must_use]
    pub const fn empty(sequence_id: u16) -> Self {
        Self {
            sequence_id,
            sub_packets: Vec::new(),
        }
    }

    /// Creates a block carrying a single payload.
    ///
    /// # Errors
    /// Returns an error if the payload is not 1..=255 bytes.
    pub fn single(sequence_id: u16, payload: impl Into<Bytes>) -> Result<Self> {
        Ok(Self {
            sequence_id,
            sub_packets: vec![SubPacket::new(payload)?],
        })
    }

    /// Appends a sub-packet.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the block is already full.
    pub fn push(&mut self, sub_packet: SubPacket) -> Result<()> {
        if self.sub_packets.len() >= MAX_SUB_PACKETS {
            return Err(CoreError::limit_exceeded(
                "sub-packet",
                MAX_SUB_PACKETS,
                self.sub_packets.len() + 1,
            ));
        }
        self.sub_packets.push(sub_packet);
        Ok(())
    }

    /// Sequence id of this block.
    #[must_use]
    pub const fn sequence_id(&self) -> u16 {
        self.sequence_id
    }

    /// Sub-packets in order.
    #[must_use]
    pub fn sub_packets(&self) -> &[SubPacket] {
        &self.sub_packets
    }

    /// Sub-packet count as written on the wire.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn wire_count(&self) -> u8 {
        self.sub_packets.len() as u8
    }

    /// Number of bytes this block occupies when encoded.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MSG_BLOCK_HEADER_SIZE
            + self
                .sub_packets
                .iter()
                .map(|sp| 1 + sp.len())
                .sum::<usize>()
    }

    /// Consumes the block, returning its sub-packets.
    #[must_use]
    pub fn into_sub_packets(self) -> Vec<SubPacket> {
        self.sub_packets
    }
}

// ============================================
// OrderedPacket
// ============================================

/// Envelope multiplexing 1..=255 [`MsgBlock`]s into one transmission.
///
/// # Wire Format
/// ```text
/// ┌────────────┬────────────┬──────────────────┐
/// │ 0x04 (u8)  │ count (u8) │ count x MsgBlock │
/// └────────────┴────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderedPacket {
    blocks: Vec<MsgBlock>,
}

impl OrderedPacket {
    /// Creates a packet from its blocks.
    ///
    /// # Errors
    /// - `EmptyContainer` for zero blocks
    /// - `LimitExceeded` for more than 255 blocks
    pub fn new(blocks: Vec<MsgBlock>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(FramingViolation::EmptyContainer.into());
        }
        if blocks.len() > MAX_BLOCKS {
            return Err(CoreError::limit_exceeded("block", MAX_BLOCKS, blocks.len()));
        }
        Ok(Self { blocks })
    }

    /// Wraps exactly one block.
    #[must_use]
    pub fn single(block: MsgBlock) -> Self {
        Self {
            blocks: vec![block],
        }
    }

    /// Appends a block.
    ///
    /// # Errors
    /// Returns `LimitExceeded` if the packet already has 255 blocks.
    pub fn push(&mut self, block: MsgBlock) -> Result<()> {
        if self.blocks.len() >= MAX_BLOCKS {
            return Err(CoreError::limit_exceeded(
                "block",
                MAX_BLOCKS,
                self.blocks.len() + 1,
            ));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Blocks in order.
    #[must_use]
    pub fn blocks(&self) -> &[MsgBlock] {
        &self.blocks
    }

    /// Block count as written on the wire.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn wire_count(&self) -> u8 {
        self.blocks.len() as u8
    }

    /// Number of bytes this packet occupies when encoded.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        ORDERED_PACKET_HEADER_SIZE
            + self.blocks.iter().map(MsgBlock::encoded_len).sum::<usize>()
    }

    /// Total sub-packets across all blocks.
    #[must_use]
    pub fn sub_packet_count(&self) -> usize {
        self.blocks.iter().map(|b| b.sub_packets().len()).sum()
    }

    /// Consumes the packet, returning its blocks.
    #[must_use]
    pub fn into_blocks(self) -> Vec<MsgBlock> {
        self.blocks
    }
}

impl From<MsgBlock> for OrderedPacket {
    fn from(block: MsgBlock) -> Self {
        Self::single(block)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_packet_bounds() {
        assert!(matches!(
            SubPacket::new(Vec::<u8>::new()),
            Err(CoreError::InvalidFraming(FramingViolation::EmptySubPacket))
        ));
        assert!(SubPacket::new(vec![0u8; 1]).is_ok());
        assert!(SubPacket::new(vec![0u8; 255]).is_ok());
        assert!(matches!(
            SubPacket::new(vec![0u8; 256]),
            Err(CoreError::InvalidFraming(FramingViolation::LimitExceeded { .. }))
        ));
    }

    #[test]
    fn test_msg_block_sub_packet_limit() {
        let sp = SubPacket::new(vec![1u8]).unwrap();
        assert!(MsgBlock::new(0, vec![sp.clone(); 255]).is_ok());
        assert!(MsgBlock::new(0, vec![sp.clone(); 256]).is_err());

        let mut block = MsgBlock::new(0, vec![sp.clone(); 255]).unwrap();
        assert!(block.push(sp).is_err());
        assert_eq!(block.wire_count(), 255);
    }

    #[test]
    fn test_ordered_packet_block_limits() {
        assert!(matches!(
            OrderedPacket::new(Vec::new()),
            Err(CoreError::InvalidFraming(FramingViolation::EmptyContainer))
        ));
        assert!(OrderedPacket::new(vec![MsgBlock::empty(0); 255]).is_ok());
        assert!(OrderedPacket::new(vec![MsgBlock::empty(0); 256]).is_err());

        let mut packet = OrderedPacket::single(MsgBlock::empty(7));
        for _ in 1..255 {
            packet.push(MsgBlock::empty(7)).unwrap();
        }
        assert!(packet.push(MsgBlock::empty(7)).is_err());
    }

    #[test]
    fn test_encoded_len() {
        let block = MsgBlock::new(
            9,
            vec![
                SubPacket::new(vec![1u8, 2, 3]).unwrap(),
                SubPacket::new(vec![4u8]).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(block.encoded_len(), 3 + 4 + 2);

        let packet = OrderedPacket::new(vec![block, MsgBlock::empty(10)]).unwrap();
        assert_eq!(packet.encoded_len(), 2 + 9 + 3);
        assert_eq!(packet.sub_packet_count(), 2);
    }
}
