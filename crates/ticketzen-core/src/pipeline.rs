//! Receipt record assembly
//!
//! Turns a normalized OCR result into a `ReceiptRecord`: header detection,
//! merchant resolution, amount/date parsing and categorization. The async
//! `analyze` entry point wraps the OCR call and never returns an error.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::categorize::categorize;
use crate::config::HeuristicConfig;
use crate::error::{Error, Result};
use crate::header::extract_header;
use crate::knowledge::MerchantKnowledgeBase;
use crate::models::{AnalysisOutcome, CanonicalOcrResult, ReceiptRecord};
use crate::ocr::OcrBackend;
use crate::parsing::{parse_amount_fr, parse_date_fr};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Build the final record from a normalized OCR result
pub fn build_receipt_record(
    result: &CanonicalOcrResult,
    kb: &MerchantKnowledgeBase,
    heuristics: &HeuristicConfig,
) -> ReceiptRecord {
    let header = extract_header(&result.meta.lines, heuristics.header_top_n);

    // Structured field beats the spatial heuristic
    let candidate = non_blank(&result.fields.merchant).or(header.as_deref());
    let merchant = kb.resolve_with_threshold(candidate, heuristics.merchant_min_score);

    // A structured total is authoritative; raw text is only scanned without one
    let total = match non_blank(&result.fields.total) {
        Some(field) => parse_amount_fr(field),
        None => parse_amount_fr(&result.texts),
    };

    let date = non_blank(&result.fields.date_achat).and_then(parse_date_fr);
    let category = categorize(kb, merchant.as_deref());

    ReceiptRecord {
        merchant,
        date,
        total,
        lignes: result.fields.lignes.clone(),
        category,
        conf: result.conf,
        tags: result.warnings.clone(),
        header,
        texts: result.texts.clone(),
    }
}

/// Run OCR on a document and assemble its receipt record
///
/// Failures are reported in the outcome (`ok: false`, status `error`).
pub async fn analyze<B>(
    client: &B,
    kb: &MerchantKnowledgeBase,
    heuristics: &HeuristicConfig,
    content: &[u8],
    content_type: &str,
) -> AnalysisOutcome
where
    B: OcrBackend + ?Sized,
{
    let start = Instant::now();
    match run(client, kb, heuristics, content, content_type).await {
        Ok(record) => {
            info!(
                vendor = client.vendor(),
                merchant = record.merchant.as_deref().unwrap_or("-"),
                category = %record.category,
                duration_ms = start.elapsed().as_millis() as u64,
                "Receipt analyzed"
            );
            AnalysisOutcome::done(record)
        }
        Err(e) => {
            warn!(vendor = client.vendor(), error = %e, "Receipt analysis failed");
            AnalysisOutcome::failed(e.to_string())
        }
    }
}

async fn run<B>(
    client: &B,
    kb: &MerchantKnowledgeBase,
    heuristics: &HeuristicConfig,
    content: &[u8],
    content_type: &str,
) -> Result<ReceiptRecord>
where
    B: OcrBackend + ?Sized,
{
    if content.is_empty() {
        return Err(Error::InvalidData("Document is empty".into()));
    }
    let result = client.analyze(content, content_type).await?;
    Ok(build_receipt_record(&result, kb, heuristics))
}

/// Pretty-printed JSON with non-ASCII characters kept as-is
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Persist a record as pretty JSON
pub fn write_record(path: &Path, record: &ReceiptRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_pretty_json(record)?)?;
    Ok(())
}
