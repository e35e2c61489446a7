// ============================================
// File: crates/mxo-core/src/protocol/codec.rs
// ============================================
//! # Ordered Packet Codec
//!
//! ## Creation Reason
//! Provides binary serialization and deserialization for the ordered,
//! sequenced, multi-sub-packet container that carries every protocol
//! message between client and server.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface over `ByteBuffer`
//! - `FrameCodec`: Implementation for `MsgBlock` and `OrderedPacket`
//! - `*_exact` entry points that also reject trailing bytes
//!
//! ## Parsing Strategy
//! 1. Read opcode, reject anything but 0x04
//! 2. Read block count, reject 0
//! 3. Per block: big-endian sequence id, sub-packet count
//! 4. Per sub-packet: length byte (reject 0) then payload
//! 5. Caller-facing entry point: reject leftover bytes
//!
//! ## ⚠️ Important Note for Next Developer
//! - Each decode starts fresh and either fully succeeds or fails; there
//!   is no partial result and no state kept between calls
//! - Always read through `ByteBuffer`, never index raw slices
//! - All counts and lengths are single bytes, so one decode allocates
//!   at most 255 x 255 x 255 payload bytes
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::Bytes;

use mxo_common::{ByteBuffer, CommonError};

use crate::error::{CoreError, FramingViolation, Result};
use crate::protocol::messages::{MsgBlock, OrderedPacket, SubPacket};
use crate::protocol::wire::{ORDERED_PACKET_OPCODE, SEQUENCE_ID_ORDER};

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol structures.
///
/// # Type Parameters
/// * `T` - The structure to encode/decode
pub trait Codec<T> {
    /// Encodes a value at the buffer's write position.
    ///
    /// # Arguments
    /// * `msg` - The value to encode
    /// * `buf` - Buffer to write encoded bytes
    fn encode(&self, msg: &T, buf: &mut ByteBuffer);

    /// Decodes a value from the buffer's read position.
    ///
    /// # Returns
    /// The decoded value, or an error if decoding fails. Bytes after the
    /// value are left unread.
    fn decode(&self, buf: &mut ByteBuffer) -> Result<T>;
}

// ============================================
// FrameCodec
// ============================================

/// Codec implementation for ordered packets and their blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new frame codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the opcode of a buffer without consuming it.
    ///
    /// # Errors
    /// Returns `TruncatedInput` for an empty buffer.
    pub fn peek_opcode(buf: &[u8]) -> Result<u8> {
        buf.first()
            .copied()
            .ok_or_else(|| CommonError::truncated(1, 0).into())
    }

    /// Returns `true` if the buffer starts with the ordered-packet opcode.
    #[must_use]
    pub fn is_ordered_packet(buf: &[u8]) -> bool {
        matches!(Self::peek_opcode(buf), Ok(ORDERED_PACKET_OPCODE))
    }
}

// ============================================
// MsgBlock Codec
// ============================================

impl Codec<MsgBlock> for FrameCodec {
    fn encode(&self, msg: &MsgBlock, buf: &mut ByteBuffer) {
        buf.write_u16(msg.sequence_id(), SEQUENCE_ID_ORDER);
        buf.write_u8(msg.wire_count());
        for sub_packet in msg.sub_packets() {
            buf.write_u8(sub_packet.wire_len());
            buf.append(sub_packet.as_bytes());
        }
    }

    fn decode(&self, buf: &mut ByteBuffer) -> Result<MsgBlock> {
        let sequence_id = buf.read_u16(SEQUENCE_ID_ORDER)?;
        let count = buf.read_u8()?;

        let mut sub_packets = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let len = buf.read_u8()?;
            if len == 0 {
                return Err(FramingViolation::EmptySubPacket.into());
            }
            let payload = Bytes::copy_from_slice(buf.read_bytes(usize::from(len))?);
            sub_packets.push(SubPacket::new(payload)?);
        }

        MsgBlock::new(sequence_id, sub_packets)
    }
}

// ============================================
// OrderedPacket Codec
// ============================================

impl Codec<OrderedPacket> for FrameCodec {
    fn encode(&self, msg: &OrderedPacket, buf: &mut ByteBuffer) {
        buf.write_u8(ORDERED_PACKET_OPCODE);
        buf.write_u8(msg.wire_count());
        for block in msg.blocks() {
            Codec::<MsgBlock>::encode(self, block, buf);
        }
    }

    fn decode(&self, buf: &mut ByteBuffer) -> Result<OrderedPacket> {
        let opcode = buf.read_u8()?;
        if opcode != ORDERED_PACKET_OPCODE {
            return Err(FramingViolation::UnexpectedOpcode(opcode).into());
        }

        let count = buf.read_u8()?;
        if count == 0 {
            return Err(FramingViolation::EmptyContainer.into());
        }

        let mut blocks = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            blocks.push(Codec::<MsgBlock>::decode(self, buf)?);
        }

        OrderedPacket::new(blocks)
    }
}

// ============================================
// Convenience Functions
// ============================================

fn ensure_consumed(buf: &ByteBuffer) -> Result<()> {
    match buf.remaining() {
        0 => Ok(()),
        extra => Err(CoreError::InvalidFraming(FramingViolation::TrailingBytes(extra))),
    }
}

/// Writes a block at the buffer's write position.
pub fn encode_msg_block(block: &MsgBlock, buf: &mut ByteBuffer) {
    FrameCodec.encode(block, buf);
}

/// Reads one block; bytes after it are left for the caller.
///
/// # Errors
/// - `TruncatedInput` if a field runs past the end of the buffer
/// - `EmptySubPacket` if a sub-packet declares length 0
pub fn decode_msg_block(buf: &mut ByteBuffer) -> Result<MsgBlock> {
    FrameCodec.decode(buf)
}

/// Decodes a buffer that must hold exactly one block.
///
/// # Errors
/// As [`decode_msg_block`], plus `TrailingBytes` if input is left over.
pub fn decode_msg_block_exact(bytes: &[u8]) -> Result<MsgBlock> {
    let mut buf = ByteBuffer::from(bytes);
    let block = decode_msg_block(&mut buf)?;
    ensure_consumed(&buf)?;
    Ok(block)
}

/// Writes a packet at the buffer's write position.
pub fn encode_ordered_packet(packet: &OrderedPacket, buf: &mut ByteBuffer) {
    FrameCodec.encode(packet, buf);
}

/// Encodes a packet into a fresh byte vector.
#[must_use]
pub fn encode_ordered_packet_to_vec(packet: &OrderedPacket) -> Vec<u8> {
    let mut buf = ByteBuffer::with_capacity(packet.encoded_len());
    encode_ordered_packet(packet, &mut buf);
    buf.into_vec()
}

/// Reads one packet; bytes after it are left for the caller.
///
/// # Errors
/// - `UnexpectedOpcode` if the first byte is not 0x04
/// - `EmptyContainer` if the block count is 0
/// - any block-level error, propagated immediately
pub fn decode_ordered_packet(buf: &mut ByteBuffer) -> Result<OrderedPacket> {
    FrameCodec.decode(buf)
}

/// Decodes a complete datagram into a packet.
///
/// This is the entry point for network input: the whole buffer must be
/// consumed by one structurally valid packet.
///
/// # Errors
/// As [`decode_ordered_packet`], plus `TrailingBytes` if input is left over.
pub fn decode_ordered_packet_exact(bytes: &[u8]) -> Result<OrderedPacket> {
    let mut buf = ByteBuffer::from(bytes);
    let packet = decode_ordered_packet(&mut buf)?;
    ensure_consumed(&buf)?;
    Ok(packet)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_block() -> MsgBlock {
        MsgBlock::single(1, vec![0xAAu8, 0xBB]).unwrap()
    }

    #[test]
    fn test_msg_block_reference_vector() {
        let mut buf = ByteBuffer::new();
        encode_msg_block(&reference_block(), &mut buf);
        assert_eq!(buf.contents(), &[0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB]);

        let decoded = decode_msg_block_exact(buf.contents()).unwrap();
        assert_eq!(decoded, reference_block());
    }

    #[test]
    fn test_ordered_packet_reference_vector() {
        let packet = OrderedPacket::single(reference_block());
        let encoded = encode_ordered_packet_to_vec(&packet);
        assert_eq!(encoded, vec![0x04, 0x01, 0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB]);
        assert_eq!(encoded.len(), packet.encoded_len());

        assert_eq!(decode_ordered_packet_exact(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_sequence_id_is_big_endian() {
        let block = MsgBlock::empty(0x1234);
        let mut buf = ByteBuffer::new();
        encode_msg_block(&block, &mut buf);
        assert_eq!(buf.contents(), &[0x12, 0x34, 0x00]);
    }

    #[test]
    fn test_multi_block_roundtrip() {
        let packet = OrderedPacket::new(vec![
            MsgBlock::new(
                7,
                vec![
                    SubPacket::new(vec![1u8, 2, 3]).unwrap(),
                    SubPacket::new(vec![0xFFu8; 255]).unwrap(),
                ],
            )
            .unwrap(),
            MsgBlock::empty(8),
            MsgBlock::single(0xFFFF, vec![9u8]).unwrap(),
        ])
        .unwrap();

        let encoded = encode_ordered_packet_to_vec(&packet);
        assert_eq!(decode_ordered_packet_exact(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_msg_block_rejects_short_buffer() {
        for input in [&[][..], &[0x00u8][..]] {
            let err = decode_msg_block_exact(input).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Common(CommonError::TruncatedInput { .. })
            ));
        }
    }

    #[test]
    fn test_msg_block_rejects_missing_sub_packets() {
        // Declares two sub-packets, carries one.
        let input = [0x00, 0x01, 0x02, 0x01, 0xAA];
        let err = decode_msg_block_exact(&input).unwrap_err();
        assert!(err.is_protocol_error());
        assert!(matches!(
            err,
            CoreError::Common(CommonError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_msg_block_rejects_short_payload() {
        let input = [0x00, 0x01, 0x01, 0x05, 0xAA, 0xBB];
        assert!(decode_msg_block_exact(&input).is_err());
    }

    #[test]
    fn test_msg_block_rejects_zero_length_sub_packet() {
        let input = [0x00, 0x01, 0x01, 0x00];
        let err = decode_msg_block_exact(&input).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidFraming(FramingViolation::EmptySubPacket)
        ));
    }

    #[test]
    fn test_msg_block_leaves_trailing_bytes_to_caller() {
        let mut buf = ByteBuffer::from_vec(vec![0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB, 0xCC]);
        assert_eq!(decode_msg_block(&mut buf).unwrap(), reference_block());
        assert_eq!(buf.remaining(), 1);

        assert!(matches!(
            decode_msg_block_exact(buf.contents()),
            Err(CoreError::InvalidFraming(FramingViolation::TrailingBytes(1)))
        ));
    }

    #[test]
    fn test_ordered_packet_rejects_trailing_byte() {
        let mut encoded = encode_ordered_packet_to_vec(&OrderedPacket::single(reference_block()));
        encoded.push(0x00);

        let err = decode_ordered_packet_exact(&encoded).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidFraming(FramingViolation::TrailingBytes(1))
        ));

        // The non-exact decoder accepts it and leaves the byte unread.
        let mut buf = ByteBuffer::from_vec(encoded);
        assert!(decode_ordered_packet(&mut buf).is_ok());
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn test_ordered_packet_rejects_wrong_opcode() {
        for opcode in [0x00u8, 0x03, 0x05, 0xFF] {
            let input = [opcode, 0x01, 0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB];
            let err = decode_ordered_packet_exact(&input).unwrap_err();
            assert!(matches!(
                err,
                CoreError::InvalidFraming(FramingViolation::UnexpectedOpcode(op)) if op == opcode
            ));
        }
    }

    #[test]
    fn test_ordered_packet_rejects_zero_blocks() {
        let err = decode_ordered_packet_exact(&[0x04, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidFraming(FramingViolation::EmptyContainer)
        ));
    }

    #[test]
    fn test_ordered_packet_propagates_block_failure() {
        // Second block has a zero-length sub-packet.
        let input = [
            0x04, 0x02, //
            0x00, 0x01, 0x01, 0x01, 0xAA, //
            0x00, 0x02, 0x01, 0x00,
        ];
        assert!(matches!(
            decode_ordered_packet_exact(&input),
            Err(CoreError::InvalidFraming(FramingViolation::EmptySubPacket))
        ));
    }

    #[test]
    fn test_ordered_packet_rejects_missing_blocks() {
        let input = [0x04, 0x02, 0x00, 0x01, 0x00];
        assert!(decode_ordered_packet_exact(&input).is_err());
    }

    #[test]
    fn test_peek_opcode() {
        assert!(FrameCodec::peek_opcode(&[]).is_err());
        assert!(FrameCodec::is_ordered_packet(&[0x04, 0x01]));
        assert!(!FrameCodec::is_ordered_packet(&[0x05]));
    }
}
