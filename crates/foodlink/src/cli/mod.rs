//! Command-line interface for foodlink.
//!
//! This module provides the CLI structure and output rendering for the
//! `foodlink` binary.

mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClaimArgs, ClaimCommand, ClaimStatusArg, ConfigCommand, FiltersCommand, ImportCommand,
    ListingArgs, ListingCommand, ListingsCommand, OutputFormat, ProviderArgs, ProviderCommand,
    ReceiverArgs, ReceiverCommand, ReportCommand, StatusCommand,
};
pub use render::render;

/// foodlink - Track food donations from providers to receivers
///
/// Keeps providers, receivers, food listings and claims in a local `SQLite`
/// database, imports CSV snapshots and answers a fixed set of questions
/// about them.
#[derive(Debug, Parser)]
#[command(name = "foodlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides `database.path`)
    #[arg(short, long, global = true, value_name = "DB")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema
    Init,

    /// Load CSV files into empty tables
    Import(ImportCommand),

    /// Show database location and row counts
    Status(StatusCommand),

    /// Show the values available for listing filters
    Filters(FiltersCommand),

    /// Browse food listings with their providers
    Listings(ListingsCommand),

    /// Run a named analysis
    Report(ReportCommand),

    /// Manage providers
    #[command(subcommand)]
    Provider(ProviderCommand),

    /// Manage receivers
    #[command(subcommand)]
    Receiver(ReceiverCommand),

    /// Manage food listings
    #[command(subcommand)]
    Listing(ListingCommand),

    /// Manage claims
    #[command(subcommand)]
    Claim(ClaimCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command needs the database.
    #[must_use]
    pub fn uses_database(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
