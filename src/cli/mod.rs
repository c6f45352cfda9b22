//! CLI module - Command-line interface for Pantry
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

pub use commands::{cmd_create_user, cmd_init, cmd_migrate};

use clap::{Parser, Subcommand};

/// Pantry - recipe manager backend
/// Stores recipes with tags, ingredients and images behind a token-authenticated HTTP API
#[derive(Parser)]
#[command(name = "pantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create a default config file
    Init,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create a regular account
    CreateUser {
        /// Email address used to log in
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,

        /// Password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account with staff and superuser flags
    CreateSuperuser {
        /// Email address used to log in
        #[arg(long)]
        email: String,

        /// Password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
}
