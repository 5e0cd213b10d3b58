//! Configuration display

use std::path::Path;

use anyhow::Result;
use serde_json::{json, Value};
use ticketzen_core::config::default_config_path;
use ticketzen_core::knowledge::default_catalog_path;
use ticketzen_core::Config;

use super::{load_catalog, load_config};

/// Print the resolved configuration with the endpoint and key masked
pub fn cmd_config(config_path: Option<&Path>, merchants_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let kb = load_catalog(merchants_path);

    let mut summary = config_summary(&config);
    summary["files"] = json!({
        "config": config_path
            .map(Path::to_path_buf)
            .or_else(default_config_path)
            .map(|p| p.display().to_string()),
        "merchants": merchants_path
            .map(Path::to_path_buf)
            .or_else(default_catalog_path)
            .map(|p| p.display().to_string()),
        "merchants_loaded": kb.len(),
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Configuration as JSON, without secrets
pub fn config_summary(config: &Config) -> Value {
    let ocr = &config.ocr;
    json!({
        "ocr": {
            "endpoint_set": !ocr.endpoint.trim().is_empty(),
            "key_set": !ocr.key.trim().is_empty(),
            "route": ocr.route.as_str(),
            "api_version": ocr.api_version_for(ocr.route),
            "timeout_secs": ocr.timeout.as_secs(),
            "dry_run": ocr.dry_run,
            "cloud_enabled": ocr.cloud_enabled,
            "vendor": ocr.vendor,
            "offline": ocr.is_offline(),
            "debug_dir": ocr.debug_dir.display().to_string(),
        },
        "heuristics": {
            "header_top_n": config.heuristics.header_top_n,
            "header_min_score": config.heuristics.header_min_score,
            "merchant_min_score": config.heuristics.merchant_min_score,
        },
    })
}
