// ============================================
// File: crates/mxo-core/src/protocol/commands.rs
// ============================================
//! # Command Payloads
//!
//! ## Creation Reason
//! Fixed-layout payloads the server pushes to clients inside ordered
//! packets. They carry no decision logic; they exist so the byte layouts
//! live next to the field table instead of being scattered as hex.
//!
//! ## Main Functionality
//! - `system_chat`: system chat line
//! - `load_world`: world load command with district and sky
//! - `set_experience` / `set_information`: 64-bit stat updates
//! - `event_url`: in-game event URL
//! - `hex_generic`: static payload from a hex dump
//!
//! ## ⚠️ Important Note for Next Developer
//! - Strings are NUL-terminated and their u16 length prefix counts the
//!   terminator
//! - Opcodes are big-endian, everything else little-endian (see `wire`)
//!
//! ## Last Modified
//! v0.1.0 - Initial command payloads

use std::fmt;

use bytes::Bytes;

use mxo_common::{ByteBuffer, CommonError};

use crate::error::Result;
use crate::protocol::wire::{
    COMMAND_OPCODE_ORDER, COMMAND_VALUE_ORDER, STRING_LENGTH_ORDER, WORLD_MAGIC_ORDER,
};

// ============================================
// Constants
// ============================================

/// Fixed prefix of a system chat payload.
const SYSTEM_CHAT_HEADER: [u8; 36] = [
    0x2E, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x24, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// Opcode of the world load command.
pub const LOAD_WORLD_OPCODE: u16 = 0x060E;

/// Constant world tag that follows the location in `load_world`.
pub const LOAD_WORLD_MAGIC: u32 = 0xD868_C847;

/// Opcode of the experience update.
pub const SET_EXPERIENCE_OPCODE: u16 = 0x80E5;

/// Opcode of the information (cash) update.
pub const SET_INFORMATION_OPCODE: u16 = 0x80E4;

/// Opcode of the event URL command.
pub const EVENT_URL_OPCODE: u16 = 0x81A5;

// ============================================
// WorldLocation
// ============================================

/// District loaded by [`load_world`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WorldLocation {
    /// Richland slums and barrens.
    Slums = 0x01,
    /// Downtown.
    Downtown = 0x02,
    /// International district.
    International = 0x03,
}

impl WorldLocation {
    /// Client resource path of the district's world file.
    #[must_use]
    pub const fn metr_path(self) -> &'static str {
        match self {
            Self::Slums => "resource/worlds/final_world/slums_barrens_full.metr",
            Self::Downtown => "resource/worlds/final_world/downtown/dt_world.metr",
            Self::International => "resource/worlds/final_world/international/it.metr",
        }
    }

    /// Wire value of the location.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for WorldLocation {
    type Error = CommonError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Slums),
            0x02 => Ok(Self::Downtown),
            0x03 => Ok(Self::International),
            other => Err(CommonError::invalid_input(
                "location",
                format!("unknown district {other}"),
            )),
        }
    }
}

impl fmt::Display for WorldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Slums => "slums",
            Self::Downtown => "downtown",
            Self::International => "international",
        };
        f.write_str(name)
    }
}

// ============================================
// Helpers
// ============================================

/// Length of `text` plus its terminator, as carried in a u16 prefix.
fn c_string_len(field: &str, text: &str) -> Result<u16> {
    if text.contains('\0') {
        return Err(CommonError::invalid_input(field, "contains NUL byte").into());
    }
    u16::try_from(text.len() + 1).map_err(|_| {
        CommonError::invalid_input(field, format!("{} bytes exceeds u16 length", text.len())).into()
    })
}

fn write_c_string(buf: &mut ByteBuffer, text: &str) {
    buf.append(text.as_bytes());
    buf.write_u8(0);
}

// ============================================
// Builders
// ============================================

/// Builds a system chat payload.
///
/// # Errors
/// Returns `InvalidInput` if the message contains NUL or is too long for
/// its u16 length field.
pub fn system_chat(message: &str) -> Result<Bytes> {
    let len = c_string_len("message", message)?;

    let mut buf = ByteBuffer::with_capacity(SYSTEM_CHAT_HEADER.len() + 2 + usize::from(len));
    buf.append(&SYSTEM_CHAT_HEADER);
    buf.write_u16(len, STRING_LENGTH_ORDER);
    write_c_string(&mut buf, message);
    Ok(buf.freeze())
}

/// Builds a world load command.
///
/// The u16 after the header is the offset of the sky length field,
/// counted from the start of the payload.
///
/// # Errors
/// Returns `InvalidInput` if `sky` contains NUL or is too long.
pub fn load_world(location: WorldLocation, sky: &str) -> Result<Bytes> {
    let metr = location.metr_path();
    let metr_len = c_string_len("metr", metr)?;
    let sky_len = c_string_len("sky", sky)?;

    let mut buf = ByteBuffer::new();
    buf.write_u16(LOAD_WORLD_OPCODE, COMMAND_OPCODE_ORDER);
    buf.write_u8(0);
    buf.write_u32(location.as_u32(), COMMAND_VALUE_ORDER);
    buf.write_u32(LOAD_WORLD_MAGIC, WORLD_MAGIC_ORDER);
    buf.write_u8(1);

    let sky_offset = buf.wpos() + 2 + 2 + usize::from(metr_len);
    let sky_offset = u16::try_from(sky_offset)
        .map_err(|_| CommonError::invalid_input("metr", "offset exceeds u16"))?;

    buf.write_u16(sky_offset, STRING_LENGTH_ORDER);
    buf.write_u16(metr_len, STRING_LENGTH_ORDER);
    write_c_string(&mut buf, metr);
    buf.write_u16(sky_len, STRING_LENGTH_ORDER);
    write_c_string(&mut buf, sky);
    Ok(buf.freeze())
}

/// Builds an experience update.
#[must_use]
pub fn set_experience(experience: u64) -> Bytes {
    opcode_with_u64(SET_EXPERIENCE_OPCODE, experience)
}

/// Builds an information (cash) update.
#[must_use]
pub fn set_information(cash: u64) -> Bytes {
    opcode_with_u64(SET_INFORMATION_OPCODE, cash)
}

fn opcode_with_u64(opcode: u16, value: u64) -> Bytes {
    let mut buf = ByteBuffer::with_capacity(10);
    buf.write_u16(opcode, COMMAND_OPCODE_ORDER);
    buf.write_u64(value, COMMAND_VALUE_ORDER);
    buf.freeze()
}

/// Builds an event URL command.
///
/// # Errors
/// Returns `InvalidInput` if the URL contains NUL or is too long.
pub fn event_url(url: &str) -> Result<Bytes> {
    let len = c_string_len("url", url)?;

    let mut buf = ByteBuffer::new();
    buf.write_u16(EVENT_URL_OPCODE, COMMAND_OPCODE_ORDER);
    buf.write_u16(0, COMMAND_VALUE_ORDER);
    buf.write_u16(7, COMMAND_VALUE_ORDER);
    buf.write_u8(5);
    buf.write_u16(len, STRING_LENGTH_ORDER);
    write_c_string(&mut buf, url);
    Ok(buf.freeze())
}

/// Builds a static payload from a hex dump.
///
/// # Errors
/// Returns `Decoding` for invalid hex.
pub fn hex_generic(hex_data: &str) -> Result<Bytes> {
    let bytes = hex::decode(hex_data.trim()).map_err(CommonError::from)?;
    Ok(Bytes::from(bytes))
}

// ============================================
// Tests
// ============================================
