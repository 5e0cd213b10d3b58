//! Offline OCR backend
//!
//! Returns a fixed receipt without touching the network, so the rest of the
//! pipeline can run with OCR disabled or unconfigured.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::models::{CanonicalOcrResult, Line, LineItem, OcrFields, OcrMeta};

use super::OcrBackend;

/// Backend that always returns `stub_result()`
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn new() -> Self {
        Self
    }
}

/// The canned receipt returned in offline mode
pub fn stub_result() -> CanonicalOcrResult {
    CanonicalOcrResult {
        fields: OcrFields {
            merchant: Some("Netto".to_string()),
            date_achat: Some("2024-05-01".to_string()),
            total: Some("9,42".to_string()),
            lignes: vec![LineItem {
                name: Some("Pain".to_string()),
                price: Some("1,00".to_string()),
            }],
        },
        conf: Some(0.8),
        texts: "Netto\n01/05/2024\nTotal 9,42".to_string(),
        meta: OcrMeta {
            lines: vec![Line {
                text: "Netto".to_string(),
                y_norm: 0.05,
                page: 1,
            }],
        },
        warnings: vec!["dry_run=true".to_string()],
    }
}

#[async_trait]
impl OcrBackend for DryRunBackend {
    async fn analyze(&self, content: &[u8], content_type: &str) -> Result<CanonicalOcrResult> {
        info!(
            bytes = content.len(),
            content_type, "OCR in dry-run or disabled mode, returning stub result"
        );
        Ok(stub_result())
    }

    fn vendor(&self) -> &str {
        "dry-run"
    }

    fn host(&self) -> &str {
        "offline"
    }
}
