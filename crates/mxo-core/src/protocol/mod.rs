// ============================================
// File: crates/mxo-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wire side of the auth server: the per-field byte-order
//! table, the ordered packet container and the fixed command payloads
//! carried inside it.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`wire`]: Per-field byte orders and protocol constants
//! - [`messages`]: `SubPacket`, `MsgBlock`, `OrderedPacket`
//! - [`codec`]: Binary serialization/deserialization
//! - [`commands`]: Fixed-layout command payloads
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ 0x04 │ n │ MsgBlock 1 │ MsgBlock 2 │ ... │ MsgBlock n       │
//! └──────────────┬──────────────────────────────────────────────┘
//!                ▼
//!   ┌────────────┬───┬──────────┬──────────┬─────┐
//!   │ seq (u16 BE)│ m │ len│data │ len│data │ ... │
//!   └────────────┴───┴──────────┴──────────┴─────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Byte order is per field; always go through [`wire`]
//! - Test vectors must be kept for every layout change
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod commands;
pub mod messages;
pub mod wire;

// Re-export primary types
pub use codec::{
    decode_msg_block, decode_msg_block_exact, decode_ordered_packet,
    decode_ordered_packet_exact, encode_msg_block, encode_ordered_packet,
    encode_ordered_packet_to_vec, Codec, FrameCodec,
};
pub use messages::{MsgBlock, OrderedPacket, SubPacket};
pub use wire::ORDERED_PACKET_OPCODE;
