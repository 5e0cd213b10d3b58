//! TicketZen CLI - French receipt extraction
//!
//! Usage:
//!   ticketzen analyze --file RECEIPT.jpg       Run OCR and print the receipt record
//!   ticketzen normalize --file RESPONSE.json   Normalize a saved provider response
//!   ticketzen merchants resolve "CARREFOUR"    Resolve a merchant name
//!   ticketzen parse amount "9,42"              Try the amount parser
//!   ticketzen config                           Show the resolved configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    let merchants = cli.merchants.as_deref();

    match cli.command {
        Commands::Analyze {
            file,
            output,
            dry_run,
            route,
        } => {
            commands::cmd_analyze(
                config,
                merchants,
                &file,
                output.as_deref(),
                dry_run,
                route.as_deref(),
            )
            .await
        }
        Commands::Normalize {
            file,
            variant,
            record,
        } => commands::cmd_normalize(config, merchants, &file, &variant, record),
        Commands::Merchants { action } => {
            let kb = commands::load_catalog(merchants);
            match action {
                None | Some(MerchantsAction::List) => commands::cmd_merchants_list(&kb),
                Some(MerchantsAction::Resolve { text }) => {
                    let config = commands::load_config(config)?;
                    commands::cmd_merchants_resolve(&kb, &config.heuristics, &text)
                }
                Some(MerchantsAction::Categorize { text }) => {
                    let config = commands::load_config(config)?;
                    commands::cmd_merchants_categorize(&kb, &config.heuristics, &text)
                }
            }
        }
        Commands::Parse { action } => match action {
            ParseAction::Amount { text } => commands::cmd_parse_amount(&text),
            ParseAction::Date { text } => commands::cmd_parse_date(&text),
        },
        Commands::Config => commands::cmd_config(config, merchants),
    }
}
