//! Offline normalization of saved provider responses

use std::path::Path;

use anyhow::{Context, Result};
use ticketzen_core::{build_receipt_record, normalize, to_pretty_json, SchemaVariant};

use super::{load_catalog, load_config};

/// Normalize a provider response file and print the canonical result
///
/// With `record`, the receipt record built from it is printed instead.
pub fn cmd_normalize(
    config_path: Option<&Path>,
    merchants_path: Option<&Path>,
    file: &Path,
    variant: &str,
    record: bool,
) -> Result<()> {
    let variant: SchemaVariant = variant.parse().map_err(anyhow::Error::msg)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let result = normalize(&raw, variant);

    if record {
        let config = load_config(config_path)?;
        let kb = load_catalog(merchants_path);
        let receipt = build_receipt_record(&result, &kb, &config.heuristics);
        println!("{}", to_pretty_json(&receipt)?);
    } else {
        println!("{}", to_pretty_json(&result)?);
    }

    Ok(())
}
