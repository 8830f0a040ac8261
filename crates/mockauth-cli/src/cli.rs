//! CLI argument definitions for mockauth.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mockauth -- a mock auth service with local persistence.
#[derive(Parser)]
#[command(
    name = "mockauth",
    version,
    about = "mockauth -- mock authentication with local persistence",
    long_about = "A demo auth service that registers fake users and persists tokens \
                  in a local store. Nothing here is real security."
)]
pub struct Cli {
    /// Directory holding the mockauth database.
    #[arg(long, default_value = "data", env = "MOCKAUTH_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Use transient in-memory storage instead of SQLite.
    #[arg(long)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new account and start a session.
    Register {
        /// Email address (the unique account key).
        email: String,

        /// Display name.
        #[arg(long, short)]
        name: String,

        /// Password (stored in plaintext -- this is a mock).
        #[arg(long, short)]
        password: String,
    },

    /// Log in with an existing account.
    Login {
        /// Email address.
        email: String,

        /// Password.
        #[arg(long, short)]
        password: String,
    },

    /// End the current session.
    Logout,

    /// Show session status (exits nonzero when unauthenticated).
    Status,

    /// Print the current user's profile.
    Whoami,

    /// Show the current token and its display-only expiry countdown.
    Token {
        /// Issue a replacement token for the active session first.
        #[arg(long)]
        refresh: bool,
    },
}
