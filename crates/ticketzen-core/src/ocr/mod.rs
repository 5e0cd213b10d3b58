//! OCR provider abstraction
//!
//! # Architecture
//!
//! - `OcrBackend` trait: analyze a document into a `CanonicalOcrResult`
//! - `OcrClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backends: `AzureBackend` (route fallback over HTTP), `DryRunBackend` (stub)
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load(None)?;
//! let client = OcrClient::from_config(&config.ocr)?;
//! let result = client.analyze(&bytes, "image/jpeg").await?;
//! ```

mod azure;
mod dry_run;
pub mod normalize;

pub use azure::{
    write_debug_artifacts, AzureBackend, DEBUG_META_FILE, DEBUG_RESULT_FILE, KEY_HEADER,
};
pub use dry_run::{stub_result, DryRunBackend};
pub use normalize::{normalize, ProviderResponse};

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use crate::config::OcrConfig;
use crate::error::Result;
use crate::models::CanonicalOcrResult;

/// Interface for OCR providers
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Run OCR on raw document bytes
    async fn analyze(&self, content: &[u8], content_type: &str) -> Result<CanonicalOcrResult>;

    /// Provider vendor name (for logging)
    fn vendor(&self) -> &str;

    /// Provider host (for logging)
    fn host(&self) -> &str;
}

/// Concrete OCR client enum
#[derive(Clone)]
pub enum OcrClient {
    /// Azure Document Intelligence / Form Recognizer
    Azure(AzureBackend),
    /// Offline stub
    DryRun(DryRunBackend),
}

impl OcrClient {
    /// Pick a backend for the given configuration
    ///
    /// Dry-run, disabled cloud OCR or a missing endpoint/key select the
    /// offline stub. Unknown vendors fall back to Azure.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        if config.is_offline() {
            return Ok(OcrClient::DryRun(DryRunBackend::new()));
        }

        match config.vendor.to_lowercase().as_str() {
            "azure" => {}
            other => {
                warn!(vendor = %other, "Unknown OCR vendor, falling back to azure");
            }
        }
        Ok(OcrClient::Azure(AzureBackend::new(config)?))
    }

    /// Create the offline stub client directly
    pub fn dry_run() -> Self {
        OcrClient::DryRun(DryRunBackend::new())
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, OcrClient::DryRun(_))
    }
}

#[async_trait]
impl OcrBackend for OcrClient {
    async fn analyze(&self, content: &[u8], content_type: &str) -> Result<CanonicalOcrResult> {
        match self {
            OcrClient::Azure(b) => b.analyze(content, content_type).await,
            OcrClient::DryRun(b) => b.analyze(content, content_type).await,
        }
    }

    fn vendor(&self) -> &str {
        match self {
            OcrClient::Azure(b) => b.vendor(),
            OcrClient::DryRun(b) => b.vendor(),
        }
    }

    fn host(&self) -> &str {
        match self {
            OcrClient::Azure(b) => b.host(),
            OcrClient::DryRun(b) => b.host(),
        }
    }
}

/// Declared content type for an uploaded document, by file extension
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
