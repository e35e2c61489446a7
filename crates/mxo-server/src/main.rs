// ============================================
// File: crates/mxo-server/src/main.rs
// ============================================
//! # MxO Auth Server Entry Point
//!
//! ## Creation Reason
//! Main entry point for the `mxo-auth` binary. Handles CLI parsing,
//! logging setup, and server initialization.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading
//! - Key bootstrap and public key export
//! - Server execution
//!
//! ## Usage
//! ```bash
//! # Generate (or verify) key material, then exit
//! mxo-auth keygen --config auth.toml
//!
//! # Start server
//! mxo-auth start --config auth.toml
//!
//! # Other commands
//! mxo-auth validate                  # Validate config file
//! mxo-auth pubkey --format base64    # Print GetPubKeyData
//! mxo-auth pubkey --record           # Print the signed session record
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A newly generated signing key invalidates every patched client;
//!   back up `signPriv.dat`
//! - Use systemd for production deployments
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mxo_core::crypto::{CryptoOps, RsaCryptoOps};
use mxo_server::{bootstrap_keys, AuthServer, ServerConfig};

const DEFAULT_CONFIG_PATH: &str = "auth.toml";

// ============================================
// CLI Definition
// ============================================

/// MxO Auth Server
#[derive(Parser, Debug)]
#[command(name = "mxo-auth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "MXO_AUTH_CONFIG")]
        config: PathBuf,
    },

    /// Load or generate key material, then exit
    Keygen {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "MXO_AUTH_CONFIG")]
        config: PathBuf,
    },

    /// Print the public key response clients receive
    Pubkey {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "MXO_AUTH_CONFIG")]
        config: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Hex)]
        format: OutputFormat,

        /// Print the full signed record instead of GetPubKeyData
        #[arg(long)]
        record: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "MXO_AUTH_CONFIG")]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Hex,
    Base64,
}

/// Where log lines go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogTarget {
    Stdout,
    Stderr,
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Self::Start { config }
            | Self::Keygen { config }
            | Self::Pubkey { config, .. }
            | Self::Validate { config } => config,
        }
    }

    /// `pubkey` stdout carries only the key bytes.
    fn log_target(&self) -> LogTarget {
        match self {
            Self::Pubkey { .. } => LogTarget::Stderr,
            _ => LogTarget::Stdout,
        }
    }

    /// Level forced regardless of `logging.level`.
    fn level_override(&self) -> Option<&'static str> {
        match self {
            Self::Pubkey { .. } => Some("warn"),
            _ => None,
        }
    }
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    let result = run(cli.command).await;

    // Handle errors
    if let Err(e) = result {
        init_logging("error", LogTarget::Stderr);
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    if let Commands::Validate { config } = &command {
        return cmd_validate(config).await;
    }

    let config = prepare(&command).await?;
    match command {
        Commands::Start { .. } => cmd_start(config).await,
        Commands::Keygen { .. } => cmd_keygen(config).await,
        Commands::Pubkey { format, record, .. } => cmd_pubkey(config, format, record).await,
        Commands::Validate { .. } => Ok(()),
    }
}

// ============================================
// Commands
// ============================================

/// Starts the server.
async fn cmd_start(config: ServerConfig) -> anyhow::Result<()> {
    let server = AuthServer::new(config);
    server.run().await?;

    Ok(())
}

/// Bootstraps key material and reports the fingerprints.
async fn cmd_keygen(config: ServerConfig) -> anyhow::Result<()> {
    let keys = bootstrap_keys(config.key_directory().to_path_buf()).await?;

    println!("Key directory:  {}", config.key_directory().display());
    println!("Signing key:    {}", keys.signing().fingerprint());
    println!("Session key:    {}", keys.session().fingerprint());
    println!("Record size:    {} bytes", keys.public_key_record().len());

    Ok(())
}

/// Prints GetPubKeyData or the signed record.
async fn cmd_pubkey(config: ServerConfig, format: OutputFormat, record: bool) -> anyhow::Result<()> {
    let keys = bootstrap_keys(config.key_directory().to_path_buf()).await?;
    let ops = RsaCryptoOps::from(keys);

    let bytes = if record {
        ops.public_key_record().to_bytes()
    } else {
        ops.pub_key_data()
    };

    match format {
        OutputFormat::Hex => println!("{}", hex::encode(&bytes)),
        OutputFormat::Base64 => println!("{}", BASE64.encode(&bytes)),
    }

    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Server will use default values.");
        return Ok(());
    }

    let config = ServerConfig::load(config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:     {}", config.listen_addr());
    println!();
    println!("Keys:");
    println!("   Directory:  {}", config.key_directory().display());
    println!();
    println!("Limits:");
    println!("   Max Datagram:  {} bytes", config.limits.max_datagram_size);
    println!();
    println!("Logging:");
    println!("   Level:      {}", config.logging.level);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Loads config (defaults when the file does not exist), then installs
/// the one subscriber for this command.
async fn prepare(command: &Commands) -> anyhow::Result<ServerConfig> {
    let path = command.config_path();
    let found = path.exists();
    let config = if found {
        ServerConfig::load(path).await?
    } else {
        ServerConfig::default()
    };

    let level = command.level_override().unwrap_or(config.logging.level.as_str());
    init_logging(level, command.log_target());

    if !found {
        info!("Config file {} not found, using defaults", path.display());
    }
    Ok(config)
}

/// Initializes the tracing subscriber.
fn init_logging(level: &str, target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer().with_target(true);

    match target {
        LogTarget::Stdout => tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .ok(),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(layer.with_writer(std::io::stderr))
            .with(filter)
            .try_init()
            .ok(),
    };
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_pubkey_logs_to_stderr() {
        let command = parse(&["mxo-auth", "pubkey", "--format", "base64", "--record"]);
        assert_eq!(command.log_target(), LogTarget::Stderr);
        assert_eq!(command.level_override(), Some("warn"));
        assert!(matches!(
            command,
            Commands::Pubkey { format: OutputFormat::Base64, record: true, .. }
        ));
    }

    #[test]
    fn test_other_commands_use_config_level() {
        for name in ["start", "keygen", "validate"] {
            let command = parse(&["mxo-auth", name, "--config", "x.toml"]);
            assert_eq!(command.log_target(), LogTarget::Stdout);
            assert_eq!(command.level_override(), None);
            assert_eq!(command.config_path(), Path::new("x.toml"));
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
