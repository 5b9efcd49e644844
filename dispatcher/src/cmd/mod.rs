//! CLI definitions and command implementations for the dispatcher.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod init;
pub mod serve;

/// Faucet dispatcher: per-chain RPC handles and nonce counters.
#[derive(Debug, Parser)]
#[command(name = "faucet-dispatcher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a default TOML configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite the file if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Bootstrap every configured chain and hold the registry until shutdown.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(short, long, env = "CONFIG", default_value = "config.toml")]
        config: PathBuf,
    },
}
