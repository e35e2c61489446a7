// ============================================
// File: crates/mxo-server/src/handlers/packet.rs
// ============================================
//! # Packet Handler
//!
//! ## Creation Reason
//! Turns raw datagrams into `OrderedPacket` values and keeps counters of
//! what was accepted and what was dropped.
//!
//! ## Main Functionality
//! - `PacketHandler`: size check, strict decode, per-block trace logging
//! - `IngressStats` / `IngressSnapshot`: lock-free counters
//!
//! ## Packet Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1. Receive datagram                                        │
//! │                                                             │
//! │  2. Reject if larger than limits.max_datagram_size          │
//! │                                                             │
//! │  3. decode_ordered_packet_exact                             │
//! │     ┌──────┬───┬──────────────┬──────────────┬─────┐        │
//! │     │ 0x04 │ n │ MsgBlock 1   │ MsgBlock 2   │ ... │        │
//! │     └──────┴───┴──────────────┴──────────────┴─────┘        │
//! │                                                             │
//! │  4. Count accepted packet and sub-packets                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Malformed input is logged at debug level only
//! - Never panic on input; every failure becomes `InvalidPacket`
//!
//! ## Last Modified
//! v0.1.0 - Initial packet handler

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use mxo_core::protocol::decode_ordered_packet_exact;
use mxo_core::OrderedPacket;

use crate::error::{Result, ServerError};

// ============================================
// Ingress Statistics
// ============================================

/// Ingress counters.
#[derive(Debug, Default)]
pub struct IngressStats {
    pub datagrams_rx: AtomicU64,
    pub bytes_rx: AtomicU64,
    pub packets_accepted: AtomicU64,
    pub sub_packets_accepted: AtomicU64,
    pub datagrams_dropped: AtomicU64,
}

impl IngressStats {
    pub fn record_rx(&self, bytes: u64) {
        self.bytes_rx.fetch_add(bytes, Ordering::Relaxed);
        self.datagrams_rx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self, sub_packets: u64) {
        self.packets_accepted.fetch_add(1, Ordering::Relaxed);
        self.sub_packets_accepted
            .fetch_add(sub_packets, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.datagrams_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> IngressSnapshot {
        IngressSnapshot {
            datagrams_rx: self.datagrams_rx.load(Ordering::Relaxed),
            bytes_rx: self.bytes_rx.load(Ordering::Relaxed),
            packets_accepted: self.packets_accepted.load(Ordering::Relaxed),
            sub_packets_accepted: self.sub_packets_accepted.load(Ordering::Relaxed),
            datagrams_dropped: self.datagrams_dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngressSnapshot {
    pub datagrams_rx: u64,
    pub bytes_rx: u64,
    pub packets_accepted: u64,
    pub sub_packets_accepted: u64,
    pub datagrams_dropped: u64,
}

// ============================================
// PacketHandler
// ============================================

/// Decodes incoming datagrams.
///
/// # Thread Safety
/// All operations take `&self` and can be called concurrently.
#[derive(Debug)]
pub struct PacketHandler {
    /// Largest accepted datagram.
    max_datagram_size: usize,
    /// Ingress counters.
    stats: IngressStats,
}

impl PacketHandler {
    /// Creates a handler that accepts datagrams up to `max_datagram_size`.
    #[must_use]
    pub fn new(max_datagram_size: usize) -> Self {
        Self {
            max_datagram_size,
            stats: IngressStats::default(),
        }
    }

    /// Largest accepted datagram.
    #[must_use]
    pub fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    /// Processes one datagram.
    ///
    /// # Arguments
    /// * `data` - Raw datagram payload
    /// * `source` - Sender, for logging
    ///
    /// # Errors
    /// Returns `InvalidPacket` if the datagram is oversized or is not
    /// exactly one valid ordered packet.
    pub fn handle_datagram(&self, data: &[u8], source: SocketAddr) -> Result<OrderedPacket> {
        self.stats.record_rx(data.len() as u64);

        if data.len() > self.max_datagram_size {
            self.stats.record_dropped();
            debug!(%source, len = data.len(), "Dropping oversized datagram");
            return Err(ServerError::invalid_packet(
                source,
                format!("{} bytes exceeds limit {}", data.len(), self.max_datagram_size),
            ));
        }

        let packet = decode_ordered_packet_exact(data).map_err(|e| {
            self.stats.record_dropped();
            debug!(%source, len = data.len(), error = %e, "Dropping malformed datagram");
            ServerError::invalid_packet(source, e.to_string())
        })?;

        for block in packet.blocks() {
            trace!(
                %source,
                sequence_id = block.sequence_id(),
                sub_packets = block.sub_packets().len(),
                "Received message block"
            );
        }
        self.stats.record_accepted(packet.sub_packet_count() as u64);

        Ok(packet)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> IngressSnapshot {
        self.stats.snapshot()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn test_accepts_reference_packet() {
        let handler = PacketHandler::new(4096);
        let packet = handler
            .handle_datagram(&[0x04, 0x01, 0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB], source())
            .unwrap();

        assert_eq!(packet.blocks()[0].sequence_id(), 1);
        let stats = handler.stats();
        assert_eq!(stats.datagrams_rx, 1);
        assert_eq!(stats.bytes_rx, 8);
        assert_eq!(stats.packets_accepted, 1);
        assert_eq!(stats.sub_packets_accepted, 1);
        assert_eq!(stats.datagrams_dropped, 0);
    }

    #[test]
    fn test_drops_malformed() {
        let handler = PacketHandler::new(4096);
        let inputs: [&[u8]; 4] = [
            &[],
            &[0x05, 0x01],
            &[0x04, 0x00],
            &[0x04, 0x01, 0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB, 0xCC],
        ];
        for input in inputs {
            let err = handler.handle_datagram(input, source()).unwrap_err();
            assert!(err.is_packet_error());
        }
        assert_eq!(handler.stats().datagrams_dropped, 4);
        assert_eq!(handler.stats().packets_accepted, 0);
    }

    #[test]
    fn test_drops_oversized() {
        let handler = PacketHandler::new(8);
        let err = handler
            .handle_datagram(&[0x04, 0x01, 0x00, 0x01, 0x01, 0x03, 0xAA, 0xBB, 0xCC], source())
            .unwrap_err();
        assert!(err.to_string().contains("exceeds limit 8"));
        assert_eq!(handler.stats().datagrams_dropped, 1);
    }
}
