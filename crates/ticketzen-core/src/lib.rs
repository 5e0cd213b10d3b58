//! TicketZen Core Library
//!
//! Receipt extraction pipeline for French retail receipts:
//! - OCR provider client with route fallback and an offline stub
//! - Normalization of provider responses into one canonical form
//! - French amount and date parsing
//! - Merchant header detection from line layout
//! - Merchant knowledge base with pattern and fuzzy resolution
//! - Expense categorization
//! - Consolidated configuration (defaults, TOML file, environment)

pub mod categorize;
pub mod config;
pub mod error;
pub mod header;
pub mod knowledge;
pub mod models;
pub mod ocr;
pub mod parsing;
pub mod pipeline;

/// Test utilities including mock Azure server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use categorize::categorize;
pub use config::{Config, HeuristicConfig, OcrConfig};
pub use error::{Error, Result};
pub use header::{extract_header, looks_like_address};
pub use knowledge::{CatalogSource, MatchSource, MerchantKnowledgeBase, MerchantMatch, MerchantRecord};
pub use models::{
    AnalysisOutcome, AnalysisStatus, CanonicalOcrResult, Line, LineItem, OcrFields, OcrMeta,
    ReceiptRecord, Route, SchemaVariant,
};
pub use ocr::{
    content_type_for_path, normalize, AzureBackend, DryRunBackend, OcrBackend, OcrClient,
};
pub use parsing::{parse_amount_fr, parse_date_fr};
pub use pipeline::{analyze, build_receipt_record, to_pretty_json, write_record};
