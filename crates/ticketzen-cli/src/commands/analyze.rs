//! Receipt analysis command

use std::path::Path;

use anyhow::{bail, Context, Result};
use ticketzen_core::{
    analyze, content_type_for_path, to_pretty_json, write_record, AnalysisOutcome, Config,
    MerchantKnowledgeBase, OcrBackend, OcrClient, Route,
};
use tracing::info;

use super::{load_catalog, load_config};

/// OCR a receipt file and print the analysis outcome as JSON
pub async fn cmd_analyze(
    config_path: Option<&Path>,
    merchants_path: Option<&Path>,
    file: &Path,
    output: Option<&Path>,
    dry_run: bool,
    route: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let kb = load_catalog(merchants_path);
    let outcome = run_analysis(config, &kb, file, output, dry_run, route).await?;
    println!("{}", to_pretty_json(&outcome)?);

    if !outcome.ok {
        bail!(
            "Analysis failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Run the pipeline on a file, writing the record to `output` when given
pub async fn run_analysis(
    mut config: Config,
    kb: &MerchantKnowledgeBase,
    file: &Path,
    output: Option<&Path>,
    dry_run: bool,
    route: Option<&str>,
) -> Result<AnalysisOutcome> {
    if dry_run {
        config.ocr.dry_run = true;
    }
    if let Some(route) = route {
        config.ocr.route = route.parse::<Route>().map_err(anyhow::Error::msg)?;
    }

    let content =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let content_type = content_type_for_path(file);

    let client = OcrClient::from_config(&config.ocr).context("Failed to create OCR client")?;
    info!(
        file = %file.display(),
        content_type,
        vendor = client.vendor(),
        route = %config.ocr.route,
        "Analyzing receipt"
    );

    let outcome = analyze(&client, kb, &config.heuristics, &content, content_type).await;

    if let (Some(path), Some(record)) = (output, outcome.result.as_ref()) {
        write_record(path, record)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Receipt record written");
    }

    Ok(outcome)
}
