//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - OCR a receipt and build its record
//! - `config` - Resolved configuration display
//! - `merchants` - Merchant catalog inspection (list, resolve, categorize)
//! - `normalize` - Normalize a saved provider response
//! - `parse` - French amount/date parser checks

pub mod analyze;
pub mod config;
pub mod merchants;
pub mod normalize;
pub mod parse;

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;
pub use merchants::*;
pub use normalize::*;
pub use parse::*;

use std::path::Path;

use anyhow::{Context, Result};
use ticketzen_core::{Config, MerchantKnowledgeBase};

/// Load the configuration (file layer, then environment)
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Load the merchant catalog; a broken catalog yields an empty one
pub fn load_catalog(path: Option<&Path>) -> MerchantKnowledgeBase {
    MerchantKnowledgeBase::load(path)
}
