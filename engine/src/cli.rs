//! CLI interface for auditfill
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Audit document generator
///
/// Fills word-processing and spreadsheet templates from a configuration
/// table, generating the `{{IA:...}}` fields with Gemini.
#[derive(Parser, Debug)]
#[command(name = "auditfill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fill templates and write every artifact to the output directory
    Run {
        /// Configuration table (JSON workbook)
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Template files or directories
        #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
        templates: Vec<PathBuf>,

        /// Company context documents or directories
        #[arg(long, value_name = "PATH", num_args = 1..)]
        company: Vec<PathBuf>,

        /// Output directory (defaults to core.output_dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Write only the system context for review, without calling the model
    Context {
        /// Configuration table (JSON workbook)
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Company context documents or directories
        #[arg(long, value_name = "PATH", num_args = 1..)]
        company: Vec<PathBuf>,

        /// Output directory (defaults to core.output_dir)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run system diagnostics
    Doctor,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Validate the configuration file
    Validate,
}
