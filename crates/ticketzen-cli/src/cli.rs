//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// TicketZen - Extract structured data from French receipts
#[derive(Parser)]
#[command(name = "ticketzen")]
#[command(about = "Receipt OCR normalization and merchant resolution", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (TOML); defaults to the data dir override if present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Merchant catalog (YAML); defaults to the data dir override or the built-in catalog
    #[arg(long, global = true)]
    pub merchants: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run OCR on a receipt and print the extracted record
    Analyze {
        /// Receipt image or PDF
        #[arg(short, long)]
        file: PathBuf,

        /// Write the receipt record to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the OCR provider and use the built-in sample receipt
        #[arg(long)]
        dry_run: bool,

        /// First API route to try: documentintelligence, formrecognizer, formrecognizer_v21
        #[arg(long)]
        route: Option<String>,
    },

    /// Normalize a saved provider response
    Normalize {
        /// Provider response JSON
        #[arg(short, long)]
        file: PathBuf,

        /// Response schema: current or legacy
        #[arg(long, default_value = "current")]
        variant: String,

        /// Also build the receipt record
        #[arg(long)]
        record: bool,
    },

    /// Inspect the merchant catalog
    Merchants {
        #[command(subcommand)]
        action: Option<MerchantsAction>,
    },

    /// Try the French amount and date parsers
    Parse {
        #[command(subcommand)]
        action: ParseAction,
    },

    /// Show the resolved configuration (secrets masked)
    Config,
}

#[derive(Subcommand)]
pub enum MerchantsAction {
    /// List catalog merchants
    List,

    /// Resolve free text to a canonical merchant
    Resolve {
        /// Merchant text as read on the receipt
        text: String,
    },

    /// Resolve free text and show its expense category
    Categorize {
        /// Merchant text as read on the receipt
        text: String,
    },
}

#[derive(Subcommand)]
pub enum ParseAction {
    /// Parse a French amount ("1 234,56 €")
    Amount { text: String },

    /// Parse a date (DD/MM/YYYY, YYYY-MM-DD, DD-MM-YYYY, DD.MM.YYYY)
    Date { text: String },
}
