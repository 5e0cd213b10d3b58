//! Domain models for TicketZen

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A text line positioned on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    /// Vertical position normalized by page height (0 when the height is unknown)
    pub y_norm: f64,
    /// 1-based page number
    pub page: u32,
}

/// A receipt line item as read by the OCR provider (raw text, not parsed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: Option<String>,
    pub price: Option<String>,
}

/// Structured fields extracted by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrFields {
    pub merchant: Option<String>,
    pub date_achat: Option<String>,
    pub total: Option<String>,
    #[serde(default)]
    pub lignes: Vec<LineItem>,
}

/// Spatial metadata for the recognized text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrMeta {
    #[serde(default)]
    pub lines: Vec<Line>,
}

/// Schema-normalized representation of any supported OCR provider output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOcrResult {
    #[serde(default)]
    pub fields: OcrFields,
    pub conf: Option<f64>,
    /// Full raw text, newline-joined
    #[serde(default)]
    pub texts: String,
    #[serde(default)]
    pub meta: OcrMeta,
    /// Diagnostics such as which provider route succeeded
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl CanonicalOcrResult {
    /// Result returned when every provider route failed
    pub fn all_failed() -> Self {
        Self {
            warnings: vec!["azure_all_failed".to_string()],
            ..Default::default()
        }
    }
}

/// Final canonical receipt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Resolved merchant name
    pub merchant: Option<String>,
    pub date: Option<NaiveDate>,
    pub total: Option<f64>,
    pub lignes: Vec<LineItem>,
    /// Expense category, never empty
    pub category: String,
    pub conf: Option<f64>,
    /// Provider warnings
    pub tags: Vec<String>,
    /// Raw header line used for merchant resolution
    pub header: Option<String>,
    pub texts: String,
}

/// Upstream OCR API route, in fallback priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Current Document Intelligence REST API
    DocumentIntelligence,
    /// Form Recognizer REST API, new response format
    FormRecognizer,
    /// Form Recognizer v2.1 REST API, legacy response format
    #[serde(rename = "formrecognizer_v21")]
    FormRecognizerV21,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentIntelligence => "documentintelligence",
            Self::FormRecognizer => "formrecognizer",
            Self::FormRecognizerV21 => "formrecognizer_v21",
        }
    }

    /// All routes in fixed priority order
    pub fn all() -> &'static [Route] {
        &[
            Self::DocumentIntelligence,
            Self::FormRecognizer,
            Self::FormRecognizerV21,
        ]
    }

    pub fn default_api_version(&self) -> &'static str {
        match self {
            Self::DocumentIntelligence => "2024-07-31",
            Self::FormRecognizer => "2023-10-31",
            Self::FormRecognizerV21 => "v2.1",
        }
    }

    /// Request path (relative to the endpoint) for this route
    pub fn api_path(&self, api_version: &str) -> String {
        match self {
            Self::DocumentIntelligence => format!(
                "documentintelligence/documentModels/prebuilt-receipt:analyze?api-version={}",
                api_version
            ),
            Self::FormRecognizer => format!(
                "formrecognizer/documentModels/prebuilt-receipt:analyze?api-version={}",
                api_version
            ),
            Self::FormRecognizerV21 => format!(
                "formrecognizer/{}/prebuilt/receipt/analyze?includeTextDetails=true",
                api_version
            ),
        }
    }

    /// Response schema returned by this route
    pub fn schema_variant(&self) -> SchemaVariant {
        match self {
            Self::DocumentIntelligence | Self::FormRecognizer => SchemaVariant::Current,
            Self::FormRecognizerV21 => SchemaVariant::Legacy,
        }
    }

    /// The given route first, then the others in priority order
    pub fn fallback_order(primary: Route) -> Vec<Route> {
        std::iter::once(primary)
            .chain(Self::all().iter().copied().filter(|r| *r != primary))
            .collect()
    }
}

impl std::str::FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "documentintelligence" | "current" => Ok(Self::DocumentIntelligence),
            "formrecognizer" | "legacy-new" | "legacy_new" => Ok(Self::FormRecognizer),
            "formrecognizer_v21" | "legacy-v21" | "legacy_v21" | "v2.1" => {
                Ok(Self::FormRecognizerV21)
            }
            _ => Err(format!("Unknown OCR route: {}", s)),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provider response schema family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// `pages[*].lines[*]` + `documents[0].fields`
    Current,
    /// `analyzeResult.readResults` + `analyzeResult.documentResults`
    Legacy,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Legacy => "legacy",
        }
    }
}

impl std::str::FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "legacy" | "v2.1" | "v21" => Ok(Self::Legacy),
            _ => Err(format!("Unknown schema variant: {}", s)),
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline status reported alongside an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Analyzing,
    Done,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzing => "analyzing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// Outcome of the public analysis entry point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub ok: bool,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ReceiptRecord>,
}

impl AnalysisOutcome {
    pub fn done(record: ReceiptRecord) -> Self {
        Self {
            ok: true,
            status: AnalysisStatus::Done,
            error: None,
            result: Some(record),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: AnalysisStatus::Error,
            error: Some(message.into()),
            result: None,
        }
    }
}
