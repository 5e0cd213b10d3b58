//! Merchant catalog command implementations

use anyhow::Result;
use ticketzen_core::{
    categorize, CatalogSource, HeuristicConfig, MatchSource, MerchantKnowledgeBase,
};

/// List catalog merchants in file order
pub fn cmd_merchants_list(kb: &MerchantKnowledgeBase) -> Result<()> {
    let source = match kb.source() {
        CatalogSource::Embedded => "built-in".to_string(),
        CatalogSource::File(p) => p.display().to_string(),
        CatalogSource::Records => "in-memory".to_string(),
    };
    println!("Merchant catalog: {} ({} merchants)\n", source, kb.len());

    if kb.is_empty() {
        println!("No merchants loaded.");
        return Ok(());
    }

    println!(
        "{:<20} {:<15} {:>7} {:>8}",
        "NAME", "CATEGORY", "ALIASES", "PATTERNS"
    );
    println!("{}", "-".repeat(53));

    for record in kb.records() {
        println!(
            "{:<20} {:<15} {:>7} {:>8}",
            record.name,
            record.default_category.as_deref().unwrap_or("-"),
            record.aliases.len(),
            record.regex.len()
        );
    }

    Ok(())
}

/// Resolve free text and report how it matched
pub fn cmd_merchants_resolve(
    kb: &MerchantKnowledgeBase,
    heuristics: &HeuristicConfig,
    text: &str,
) -> Result<()> {
    match kb.resolve_detailed(Some(text), heuristics.merchant_min_score) {
        Some(m) => {
            let how = match (m.source, m.score) {
                (MatchSource::Regex, _) => "pattern match".to_string(),
                (MatchSource::Fuzzy, Some(score)) => format!("similarity {:.1}", score),
                (MatchSource::Passthrough, Some(score)) => format!(
                    "no match, best similarity {:.1} <= {}",
                    score, heuristics.merchant_min_score
                ),
                (source, None) => source.as_str().to_string(),
            };
            println!("\"{}\" → {} ({})", text, m.name, how);
        }
        None => println!("\"{}\" → (empty)", text),
    }
    Ok(())
}

/// Resolve free text and print its expense category
pub fn cmd_merchants_categorize(
    kb: &MerchantKnowledgeBase,
    heuristics: &HeuristicConfig,
    text: &str,
) -> Result<()> {
    let merchant = kb.resolve_with_threshold(Some(text), heuristics.merchant_min_score);
    let category = categorize(kb, merchant.as_deref());
    println!(
        "\"{}\" → {} → {}",
        text,
        merchant.as_deref().unwrap_or("-"),
        category
    );
    Ok(())
}
