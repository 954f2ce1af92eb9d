//! Command-line interface for travelreport.
//!
//! This module provides the CLI structure for the `tareport` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeleteCommand, DraftArgs, ExportCommand, ListCommand, OutputFormat,
    StatusCommand, ViewCommand,
};

/// tareport - Traveler complaint reports for travel agents
///
/// Records complaint reports with traveler and agent signatures, keeps them
/// in a local store and exports them as PDF or CSV.
#[derive(Debug, Parser)]
#[command(name = "tareport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

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
    /// Save a new report from the given fields and signatures
    Save(DraftArgs),

    /// Export reports as PDF or CSV
    #[command(subcommand)]
    Export(ExportCommand),

    /// List saved reports (dashboard)
    List(ListCommand),

    /// Open a saved report in the form
    View(ViewCommand),

    /// Delete a saved report
    Delete(DeleteCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
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
