//! Property-based tests for ordered packet framing.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use mxo_common::ByteBuffer;
use mxo_core::protocol::{decode_msg_block_exact, encode_msg_block, encode_ordered_packet_to_vec};
use mxo_core::{decode_ordered_packet_exact, MsgBlock, OrderedPacket, SubPacket};
use proptest::prelude::*;

fn sub_packet() -> impl Strategy<Value = SubPacket> {
    prop::collection::vec(any::<u8>(), 1..=255)
        .prop_map(|bytes| SubPacket::new(bytes).expect("length is in range"))
}

fn msg_block() -> impl Strategy<Value = MsgBlock> {
    (any::<u16>(), prop::collection::vec(sub_packet(), 0..8))
        .prop_map(|(seq, subs)| MsgBlock::new(seq, subs).expect("count is in range"))
}

fn ordered_packet() -> impl Strategy<Value = OrderedPacket> {
    prop::collection::vec(msg_block(), 1..8)
        .prop_map(|blocks| OrderedPacket::new(blocks).expect("count is in range"))
}

// Property: any valid packet decodes back to itself
proptest! {
    #[test]
    fn prop_ordered_packet_roundtrip(packet in ordered_packet()) {
        let bytes = encode_ordered_packet_to_vec(&packet);
        prop_assert_eq!(bytes.len(), packet.encoded_len());
        prop_assert_eq!(bytes[0], 0x04);

        let decoded = decode_ordered_packet_exact(&bytes).expect("valid packet decodes");
        prop_assert_eq!(decoded, packet);
    }
}

// Property: blocks decode back to themselves
proptest! {
    #[test]
    fn prop_msg_block_roundtrip(block in msg_block()) {
        let mut buf = ByteBuffer::new();
        encode_msg_block(&block, &mut buf);
        let decoded = decode_msg_block_exact(buf.contents()).expect("valid block decodes");
        prop_assert_eq!(decoded, block);
    }
}

// Property: any extra byte after a valid packet is rejected
proptest! {
    #[test]
    fn prop_trailing_bytes_rejected(packet in ordered_packet(), extra in prop::collection::vec(any::<u8>(), 1..16)) {
        let mut bytes = encode_ordered_packet_to_vec(&packet);
        bytes.extend_from_slice(&extra);
        prop_assert!(decode_ordered_packet_exact(&bytes).is_err());
    }
}

// Property: arbitrary bytes never panic the decoder
proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = decode_ordered_packet_exact(&data);
    }
}

// Property: block and sub-packet counts across the whole 1..=255 / 0..=255 range
fn wide_ordered_packet() -> impl Strategy<Value = OrderedPacket> {
    let small_sub = prop::collection::vec(any::<u8>(), 1..=4)
        .prop_map(|bytes| SubPacket::new(bytes).expect("length is in range"));
    let block = (any::<u16>(), prop::collection::vec(small_sub, 0..=255))
        .prop_map(|(seq, subs)| MsgBlock::new(seq, subs).expect("count is in range"));
    prop::collection::vec(block, 1..=255)
        .prop_map(|blocks| OrderedPacket::new(blocks).expect("count is in range"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_wide_counts_roundtrip(packet in wide_ordered_packet()) {
        let bytes = encode_ordered_packet_to_vec(&packet);
        prop_assert_eq!(usize::from(bytes[1]), packet.blocks().len());

        let decoded = decode_ordered_packet_exact(&bytes).expect("valid packet decodes");
        prop_assert_eq!(decoded, packet);
    }
}

#[test]
fn test_max_bound_packet_roundtrip() {
    let sub = SubPacket::new(vec![0x5Au8; 255]).expect("255 bytes is in range");
    let blocks: Vec<MsgBlock> = (0..255u16)
        .map(|seq| MsgBlock::new(seq, vec![sub.clone(); 255]).expect("255 sub-packets is in range"))
        .collect();
    let packet = OrderedPacket::new(blocks).expect("255 blocks is in range");

    let bytes = encode_ordered_packet_to_vec(&packet);
    // opcode + count, then per block: seq + count + 255 * (len + 255 bytes)
    assert_eq!(bytes.len(), 2 + 255 * (3 + 255 * 256));
    assert_eq!(&bytes[..6], &[0x04, 0xFF, 0x00, 0x00, 0xFF, 0xFF]);

    let decoded = decode_ordered_packet_exact(&bytes).expect("max-bound packet decodes");
    assert_eq!(decoded.blocks().len(), 255);
    assert!(decoded.blocks().iter().all(|b| b.sub_packets().len() == 255));
    assert_eq!(decoded, packet);
}
