// ============================================
// File: crates/mxo-server/src/handlers/mod.rs
// ============================================
//! # Packet Handlers
//!
//! ## Creation Reason
//! Provides datagram processing for the auth listener.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`packet`]: Ordered packet decoding and ingress counters
//!
//! ## Data Flow
//! ```text
//! Client → UDP:
//!   1. Receive datagram
//!   2. Check size limit
//!   3. Decode exactly one OrderedPacket
//!   4. Update counters
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers must be fast (critical path)
//! - Never panic on client input
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod packet;

pub use packet::{IngressSnapshot, PacketHandler};
