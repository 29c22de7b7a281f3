//! CLI module - Command-line interface for Keyhub
//!
//! Administrative commands work directly against the configured database,
//! so they are usable before the server has ever been started.

mod commands;

use clap::{Parser, Subcommand};

/// Keyhub - access key distribution and desktop client authentication
#[derive(Parser)]
#[command(name = "keyhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Write a default config.toml in the current directory
    #[command(alias = "--init")]
    Init,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Falls back to `KEYHUB_ADMIN_PASSWORD`
        #[arg(long, env = "KEYHUB_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Mint a batch of unowned access keys
    #[command(alias = "gen")]
    GenerateKeys {
        /// Number of keys to mint
        #[arg(short, long, default_value = "1")]
        quantity: u32,
        /// Days until expiry; 0 never expires
        #[arg(short, long, default_value = "0")]
        days: u32,
        #[arg(short, long)]
        prefix: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List accounts, newest first
    #[command(alias = "ls")]
    Users {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "50")]
        limit: u64,
    },

    /// Show account and key totals
    Stats,

    /// Block (or unblock) an account by username
    Block {
        username: String,
        #[arg(long)]
        unblock: bool,
    },
}

pub use commands::*;
