// ============================================
// File: crates/mxo-server/src/server.rs
// ============================================
//! # Auth Server Orchestrator
//!
//! ## Creation Reason
//! Main server implementation that brings the key material up, binds the
//! auth listener and manages the server lifecycle.
//!
//! ## Main Functionality
//! - `bootstrap_keys`: key store bootstrap on a blocking thread
//! - `AuthServer`: startup, UDP ingress task, graceful shutdown
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       AuthServer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1. bootstrap_keys (spawn_blocking)                         │
//! │       KeyStore<FileKeyStorage> ──► ServerKeys               │
//! │                                        │                    │
//! │                                        ▼                    │
//! │                                  RsaCryptoOps               │
//! │                                                             │
//! │  2. Main Loop                                               │
//! │     ┌────────────┐        ┌──────────────────┐              │
//! │     │ UDP Task   │ ─────► │  PacketHandler   │              │
//! │     │ recv_from  │        │  decode + count  │              │
//! │     └────────────┘        └──────────────────┘              │
//! │                                                             │
//! │  3. Ctrl+C / shutdown() ──► broadcast ──► tasks exit        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - RSA generation is CPU-bound; never run it on the async runtime
//! - A key write failure aborts startup
//! - Use tokio::select! for concurrent operations
//!
//! ## Last Modified
//! v0.1.0 - Initial server implementation

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mxo_core::crypto::{CryptoOps, FileKeyStorage, KeyStore, RsaCryptoOps, ServerKeys};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::PacketHandler;

/// Time each task gets to exit after shutdown is signalled.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================
// Key Bootstrap
// ============================================

/// Loads or generates the key material in `directory`.
///
/// Runs the key store on a blocking thread with the OS RNG.
///
/// # Errors
/// Returns `Core(Persistence)` if generated keys cannot be written.
pub async fn bootstrap_keys(directory: PathBuf) -> Result<ServerKeys> {
    info!(directory = %directory.display(), "Bootstrapping key material");

    let keys = tokio::task::spawn_blocking(move || {
        let store = KeyStore::new(FileKeyStorage::new(directory));
        store.bootstrap(&mut OsRng)
    })
    .await
    .map_err(|e| ServerError::startup_failed(format!("key bootstrap task failed: {e}")))??;

    Ok(keys)
}

// ============================================
// AuthServer
// ============================================

/// MxO auth server.
///
/// # Lifecycle
/// 1. Create with `AuthServer::new(config)`
/// 2. Start with `server.run().await`
/// 3. Shutdown via Ctrl+C or `shutdown()`
pub struct AuthServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl AuthServer {
    /// Creates a new server instance.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until shutdown.
    ///
    /// # Errors
    /// Returns error if keys cannot be bootstrapped or the socket cannot
    /// be bound.
    pub async fn run(&self) -> Result<()> {
        info!("Starting MxO auth server v{}", env!("CARGO_PKG_VERSION"));

        let keys = bootstrap_keys(self.config.key_directory().to_path_buf()).await?;
        let ops = RsaCryptoOps::from(keys);
        info!(
            signing = %ops.keys().signing().fingerprint(),
            session = %ops.keys().session().fingerprint(),
            record_len = ops.public_key_record().as_bytes().len(),
            pub_key_data_len = ops.pub_key_data().len(),
            "Key material loaded"
        );

        let listen_addr = self.config.listen_addr();
        let socket = UdpSocket::bind(listen_addr)
            .await
            .map_err(|e| ServerError::startup_failed(format!("UDP bind failed: {e}")))?;

        info!("Starting Auth server on port {}", listen_addr.port());

        let handler = Arc::new(PacketHandler::new(self.config.limits.max_datagram_size));
        self.serve(Arc::new(socket), handler).await
    }

    /// Serves datagrams from an already bound socket until shutdown.
    ///
    /// # Errors
    /// Currently infallible once the socket is bound.
    pub async fn serve(&self, socket: Arc<UdpSocket>, handler: Arc<PacketHandler>) -> Result<()> {
        let mut tasks = Vec::new();
        tasks.push(("udp", self.spawn_udp_task(socket, Arc::clone(&handler))));

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!("Server started successfully");

        // Wait for shutdown signal
        if !self.shutdown.load(Ordering::SeqCst) {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => info!("Received shutdown signal"),
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                },
                _ = shutdown_rx.recv() => info!("Shutdown requested"),
            }
        }

        // Shutdown
        info!("Shutting down server...");
        self.shutdown();

        // Wait for tasks to complete
        for (name, task) in tasks {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => debug!("Task '{}' completed", name),
                Ok(Err(e)) => warn!("Task '{}' failed: {}", name, e),
                Err(_) => warn!("Task '{}' timed out during shutdown", name),
            }
        }

        let stats = handler.stats();
        info!(
            datagrams = stats.datagrams_rx,
            accepted = stats.packets_accepted,
            dropped = stats.datagrams_dropped,
            "Server shutdown complete"
        );
        Ok(())
    }

    /// Spawns the UDP receive task.
    fn spawn_udp_task(&self, socket: Arc<UdpSocket>, handler: Arc<PacketHandler>) -> JoinHandle<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            // One spare byte so oversized datagrams are seen as oversized
            let mut buf = vec![0u8; handler.max_datagram_size() + 1];

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("UDP task received shutdown signal");
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        match result {
                            Ok((len, source)) => {
                                if shutdown.load(Ordering::SeqCst) {
                                    break;
                                }
                                // Errors are logged and counted by the handler
                                let _ = handler.handle_datagram(&buf[..len], source);
                            }
                            Err(e) => {
                                if !shutdown.load(Ordering::SeqCst) {
                                    error!("UDP receive error: {}", e);
                                }
                            }
                        }
                    }
                }
            }

            debug!("UDP task exiting");
        })
    }

    /// Triggers server shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for AuthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServer")
            .field("listen_addr", &self.config.network.listen_addr)
            .field("key_directory", &self.config.keys.directory)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_serve_counts_and_shuts_down() {
        let server = Arc::new(AuthServer::new(ServerConfig::default()));
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let handler = Arc::new(PacketHandler::new(64));

        let serve = {
            let server = Arc::clone(&server);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { server.serve(socket, handler).await })
        };

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(&[0x04, 0x01, 0x00, 0x01, 0x01, 0x02, 0xAA, 0xBB], addr)
            .await
            .unwrap();
        client.send_to(&[0x05, 0x00], addr).await.unwrap();
        client.send_to(&[0x00; 100], addr).await.unwrap();

        wait_for(|| handler.stats().datagrams_rx == 3).await;
        let stats = handler.stats();
        assert_eq!(stats.packets_accepted, 1);
        assert_eq!(stats.datagrams_dropped, 2);

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), serve)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_keys_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        // A regular file where the key directory should be
        let err = bootstrap_keys(blocker).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
