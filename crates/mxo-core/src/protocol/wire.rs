// ============================================
// File: crates/mxo-core/src/protocol/wire.rs
// ============================================
//! # Wire Field Table
//!
//! ## Creation Reason
//! The MxO protocol mixes byte orders field by field. This module is the
//! single table of every multi-byte field the crate reads or writes, so
//! codecs look the order up instead of guessing it.
//!
//! ## Field Table
//! ```text
//! ┌──────────────────────────────┬───────┬────────┐
//! │ Field                        │ Width │ Order  │
//! ├──────────────────────────────┼───────┼────────┤
//! │ MsgBlock.sequence_id         │ u16   │ big    │
//! │ PublicKeyRecord.format_tag   │ u32   │ big    │
//! │ PubKeyData length prefixes   │ u16   │ little │
//! │ Command opcodes              │ u16   │ big    │
//! │ Command string lengths       │ u16   │ little │
//! │ LoadWorld.location           │ u32   │ little │
//! │ LoadWorld.world_magic        │ u32   │ big    │
//! │ SetExperience/Information    │ u64   │ little │
//! └──────────────────────────────┴───────┴────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - These orders are what the retail client expects. Do not
//!   "normalize" them; the reference vectors in the codec tests pin them.
//!
//! ## Last Modified
//! v0.1.0 - Initial field table

use mxo_common::ByteOrder;

// ============================================
// Ordered Packet
// ============================================

/// Opcode of an ordered packet container.
pub const ORDERED_PACKET_OPCODE: u8 = 0x04;

/// Byte order of `MsgBlock::sequence_id`.
pub const SEQUENCE_ID_ORDER: ByteOrder = ByteOrder::Big;

/// Largest count a single-byte count field can carry.
pub const MAX_U8_COUNT: usize = u8::MAX as usize;

// ============================================
// Key Material
// ============================================

/// Byte order of the public key record format tag.
pub const FORMAT_TAG_ORDER: ByteOrder = ByteOrder::Big;

/// Byte order of the length prefixes in the live public key response.
pub const PUB_KEY_DATA_LENGTH_ORDER: ByteOrder = ByteOrder::Little;

// ============================================
// Command Payloads
// ============================================

/// Byte order of two-byte command opcodes.
pub const COMMAND_OPCODE_ORDER: ByteOrder = ByteOrder::Big;

/// Byte order of NUL-terminated string length prefixes.
pub const STRING_LENGTH_ORDER: ByteOrder = ByteOrder::Little;

/// Byte order of plain numeric command arguments.
pub const COMMAND_VALUE_ORDER: ByteOrder = ByteOrder::Little;

/// Byte order of the constant world tag in `LoadWorld`.
pub const WORLD_MAGIC_ORDER: ByteOrder = ByteOrder::Big;
