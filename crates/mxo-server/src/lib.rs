// ============================================
// File: crates/mxo-server/src/lib.rs
// ============================================
//! # MxO Auth Server Library
//!
//! ## Creation Reason
//! Provides the server side of the MxO auth front-end: configuration,
//! key bootstrap and the datagram listener built on `mxo-core`.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Server configuration management
//! - [`server`]: Key bootstrap and server orchestration
//! - [`handlers`]: Datagram decoding and ingress counters
//! - [`error`]: Server-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MxO Auth Server                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│ AuthServer  │────►│ PacketHandler   │    │
//! │  │   (TOML)    │     │             │     │                 │    │
//! │  └─────────────┘     └──────┬──────┘     └─────────────────┘    │
//! │                             │                                   │
//! │                             ▼                                   │
//! │                   ┌───────────────────┐                         │
//! │                   │ KeyStore (files)  │                         │
//! │                   │ RsaCryptoOps      │                         │
//! │                   └───────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - Graceful shutdown waits for the listener task
//!
//! ## Last Modified
//! v0.1.0 - Initial server library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

// Re-export primary types
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::{bootstrap_keys, AuthServer};
