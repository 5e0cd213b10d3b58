//! Provider response normalization
//!
//! Each upstream schema family is deserialized into its own typed payload and
//! converted to a `CanonicalOcrResult`. Unknown keys are ignored and missing
//! ones default, so partial responses still normalize.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::models::{CanonicalOcrResult, Line, LineItem, OcrFields, OcrMeta, SchemaVariant};

/// A provider response parsed according to its schema variant
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Current(CurrentResponse),
    Legacy(LegacyResponse),
}

impl ProviderResponse {
    /// Deserialize a raw upstream payload as the given variant
    pub fn parse(raw: &Value, variant: SchemaVariant) -> Result<Self> {
        match variant {
            SchemaVariant::Current => {
                // Some deployments wrap the body in an `analyzeResult` envelope
                let body = raw
                    .get("analyzeResult")
                    .filter(|v| v.is_object())
                    .unwrap_or(raw);
                Ok(Self::Current(CurrentResponse::deserialize(body)?))
            }
            SchemaVariant::Legacy => Ok(Self::Legacy(LegacyResponse::deserialize(raw)?)),
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        match self {
            Self::Current(_) => SchemaVariant::Current,
            Self::Legacy(_) => SchemaVariant::Legacy,
        }
    }

    pub fn into_canonical(self) -> CanonicalOcrResult {
        match self {
            Self::Current(resp) => resp.into_canonical(),
            Self::Legacy(resp) => resp.into_canonical(),
        }
    }
}

/// Normalize a raw upstream payload into the canonical form
///
/// A payload that does not match the variant's shape yields an empty result
/// tagged `schema_mismatch=<variant>`.
pub fn normalize(raw: &Value, variant: SchemaVariant) -> CanonicalOcrResult {
    match ProviderResponse::parse(raw, variant) {
        Ok(response) => response.into_canonical(),
        Err(e) => {
            warn!(variant = %variant, error = %e, "Provider response does not match schema");
            CanonicalOcrResult {
                warnings: vec![format!("schema_mismatch={}", variant)],
                ..Default::default()
            }
        }
    }
}

fn y_norm(y: f64, height: Option<f64>) -> f64 {
    match height {
        Some(h) if h > 0.0 => y / h,
        _ => 0.0,
    }
}

/// First value that is present and non-empty
fn first_text<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
}

// ========== Current variant ==========

/// `pages[*].lines[*]` + `documents[0].fields`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    pages: Vec<CurrentPage>,
    #[serde(default)]
    documents: Vec<CurrentDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentPage {
    page_number: Option<u32>,
    page: Option<u32>,
    height: Option<f64>,
    #[serde(default)]
    lines: Vec<CurrentLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentLine {
    #[serde(default)]
    content: String,
    #[serde(default)]
    bounding_polygon: Vec<Point>,
    /// Flat `[x0, y0, x1, y1, ...]` shape used by newer API versions
    #[serde(default)]
    polygon: Vec<f64>,
}

impl CurrentLine {
    fn top(&self) -> f64 {
        self.bounding_polygon
            .first()
            .map(|p| p.y)
            .or_else(|| self.polygon.get(1).copied())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct Point {
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CurrentDocument {
    #[serde(default)]
    fields: CurrentFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CurrentFields {
    merchant_name: Option<CurrentField>,
    merchant: Option<CurrentField>,
    vendor_name: Option<CurrentField>,
    transaction_date: Option<CurrentField>,
    purchase_date: Option<CurrentField>,
    total: Option<CurrentField>,
    total_due: Option<CurrentField>,
    items: Option<CurrentField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentField {
    content: Option<String>,
    value_string: Option<String>,
    value: Option<Value>,
    #[serde(default)]
    value_array: Vec<CurrentField>,
    #[serde(default)]
    value_object: Option<CurrentItemObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CurrentItemObject {
    name: Option<Box<CurrentField>>,
    total_price: Option<Box<CurrentField>>,
}

impl CurrentField {
    /// `content`, then `valueString`, then `value`
    fn text(&self) -> Option<String> {
        let value = self.value.as_ref().and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        first_text([self.content.clone(), self.value_string.clone(), value])
    }
}

fn field_text(candidates: &[&Option<CurrentField>]) -> Option<String> {
    first_text(
        candidates
            .iter()
            .map(|&field| field.as_ref().and_then(CurrentField::text)),
    )
}

impl CurrentResponse {
    pub fn into_canonical(self) -> CanonicalOcrResult {
        let mut lines = Vec::new();
        for page in &self.pages {
            let page_num = page.page_number.or(page.page).unwrap_or(1);
            for line in &page.lines {
                lines.push(Line {
                    text: line.content.clone(),
                    y_norm: y_norm(line.top(), page.height),
                    page: page_num,
                });
            }
        }

        let fields = match self.documents.first() {
            Some(doc) => {
                let f = &doc.fields;
                let lignes = f
                    .items
                    .as_ref()
                    .map(|items| {
                        items
                            .value_array
                            .iter()
                            .map(|item| {
                                let obj = item.value_object.clone().unwrap_or_default();
                                LineItem {
                                    name: obj.name.and_then(|n| n.content),
                                    price: obj.total_price.and_then(|p| p.content),
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                OcrFields {
                    merchant: field_text(&[&f.merchant_name, &f.merchant, &f.vendor_name]),
                    date_achat: field_text(&[&f.transaction_date, &f.purchase_date]),
                    total: field_text(&[&f.total, &f.total_due]),
                    lignes,
                }
            }
            None => OcrFields::default(),
        };

        CanonicalOcrResult {
            fields,
            conf: None,
            texts: self.content.unwrap_or_default(),
            meta: OcrMeta { lines },
            warnings: Vec::new(),
        }
    }
}

// ========== Legacy variant (v2.1) ==========

/// `analyzeResult.readResults` + `analyzeResult.documentResults`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyResponse {
    #[serde(default)]
    analyze_result: LegacyBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBody {
    #[serde(default)]
    read_results: Vec<LegacyPage>,
    #[serde(default)]
    document_results: Vec<LegacyDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPage {
    page: Option<u32>,
    height: Option<f64>,
    #[serde(default)]
    lines: Vec<LegacyLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyLine {
    #[serde(default)]
    text: String,
    #[serde(default)]
    bounding_box: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    fields: LegacyFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyFields {
    merchant_name: Option<LegacyField>,
    transaction_date: Option<LegacyField>,
    total: Option<LegacyField>,
    total_due: Option<LegacyField>,
    items: Option<LegacyItems>,
}

/// `Items` is either a bare array or an array field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LegacyItems {
    List(Vec<LegacyField>),
    Field(LegacyField),
}

impl LegacyItems {
    fn entries(&self) -> &[LegacyField] {
        match self {
            Self::List(items) => items,
            Self::Field(field) => &field.value_array,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyField {
    text: Option<String>,
    value_number: Option<f64>,
    #[serde(default)]
    value_array: Vec<LegacyField>,
    #[serde(default)]
    value_object: Option<LegacyItemObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyItemObject {
    name: Option<Box<LegacyField>>,
    total_price: Option<Box<LegacyField>>,
}

impl LegacyField {
    fn text(&self) -> Option<String> {
        self.text.clone().filter(|t| !t.is_empty())
    }

    fn amount_text(&self) -> Option<String> {
        self.text()
            .or_else(|| self.value_number.map(|n| format!("{:.2}", n)))
    }
}

impl LegacyResponse {
    pub fn into_canonical(self) -> CanonicalOcrResult {
        let body = self.analyze_result;

        let mut lines = Vec::new();
        let mut texts = Vec::new();
        for page in &body.read_results {
            for line in &page.lines {
                texts.push(line.text.clone());
                let top = line.bounding_box.get(1).copied().unwrap_or(0.0);
                lines.push(Line {
                    text: line.text.clone(),
                    y_norm: y_norm(top, page.height),
                    page: page.page.unwrap_or(1),
                });
            }
        }

        let fields = match body.document_results.first() {
            Some(doc) => {
                let f = &doc.fields;
                // First total field present wins, even if it carries no value
                let total = f
                    .total
                    .as_ref()
                    .or(f.total_due.as_ref())
                    .and_then(LegacyField::amount_text);
                let lignes = f
                    .items
                    .as_ref()
                    .map(|items| items.entries().iter().map(legacy_item).collect())
                    .unwrap_or_default();

                OcrFields {
                    merchant: f.merchant_name.as_ref().and_then(LegacyField::text),
                    date_achat: f.transaction_date.as_ref().and_then(LegacyField::text),
                    total,
                    lignes,
                }
            }
            None => OcrFields::default(),
        };

        CanonicalOcrResult {
            fields,
            conf: None,
            texts: texts.join("\n"),
            meta: OcrMeta { lines },
            warnings: Vec::new(),
        }
    }
}

fn legacy_item(item: &LegacyField) -> LineItem {
    let obj = item.value_object.as_ref();
    LineItem {
        name: obj
            .and_then(|o| o.name.as_ref())
            .and_then(|n| n.text())
            .or_else(|| item.text()),
        price: obj
            .and_then(|o| o.total_price.as_ref())
            .and_then(|p| p.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_payload() -> Value {
        json!({
            "status": "succeeded",
            "analyzeResult": {
                "readResults": [{
                    "page": 1,
                    "height": 1000.0,
                    "lines": [
                        {"text": "12 rue de la Paix", "boundingBox": [10, 80, 200, 80, 200, 100, 10, 100]},
                        {"text": "CARREFOUR MARKET", "boundingBox": [10, 120, 200, 120, 200, 140, 10, 140]},
                        {"text": "TOTAL 12,50", "boundingBox": [10, 900, 200, 900, 200, 920, 10, 920]}
                    ]
                }],
                "documentResults": [{
                    "fields": {
                        "MerchantName": {"type": "string", "text": "CARREFOUR MARKET"},
                        "TransactionDate": {"type": "date", "text": "14/03/2024"},
                        "Total": {"type": "number", "text": "12,50", "valueNumber": 12.5},
                        "Items": {
                            "type": "array",
                            "valueArray": [
                                {"type": "object", "valueObject": {
                                    "Name": {"text": "Lait"},
                                    "TotalPrice": {"text": "1,20"}
                                }},
                                {"type": "object", "text": "Beurre doux"}
                            ]
                        }
                    }
                }]
            }
        })
    }

    fn current_payload() -> Value {
        json!({
            "content": "Netto\n12 avenue Foch\n01/05/2024\nTOTAL 9,42",
            "pages": [{
                "pageNumber": 1,
                "height": 11.0,
                "lines": [
                    {"content": "Netto", "boundingPolygon": [{"x": 1.0, "y": 0.55}, {"x": 3.0, "y": 0.55}]},
                    {"content": "12 avenue Foch", "boundingPolygon": [{"x": 1.0, "y": 1.1}]}
                ]
            }],
            "documents": [{
                "docType": "receipt.retailMeal",
                "fields": {
                    "MerchantName": {"type": "string", "valueString": "Netto", "content": "NETTO"},
                    "TransactionDate": {"type": "date", "valueDate": "2024-05-01", "content": "01/05/2024"},
                    "Total": {"type": "currency", "content": "9,42"},
                    "Items": {
                        "type": "array",
                        "valueArray": [{
                            "type": "object",
                            "valueObject": {
                                "Description": {"content": "Pain"},
                                "Name": {"content": "Pain"},
                                "TotalPrice": {"content": "1,00"}
                            }
                        }]
                    }
                }
            }]
        })
    }

    #[test]
    fn test_legacy_lines_and_fields() {
        let result = normalize(&legacy_payload(), SchemaVariant::Legacy);

        assert_eq!(result.meta.lines.len(), 3);
        assert_eq!(result.meta.lines[1].text, "CARREFOUR MARKET");
        assert!((result.meta.lines[1].y_norm - 0.12).abs() < 1e-9);
        assert_eq!(result.meta.lines[1].page, 1);
        assert_eq!(
            result.texts,
            "12 rue de la Paix\nCARREFOUR MARKET\nTOTAL 12,50"
        );

        assert_eq!(result.fields.merchant.as_deref(), Some("CARREFOUR MARKET"));
        assert_eq!(result.fields.date_achat.as_deref(), Some("14/03/2024"));
        assert_eq!(result.fields.total.as_deref(), Some("12,50"));
        assert_eq!(
            result.fields.lignes,
            vec![
                LineItem {
                    name: Some("Lait".into()),
                    price: Some("1,20".into())
                },
                LineItem {
                    name: Some("Beurre doux".into()),
                    price: None
                },
            ]
        );
        assert!(result.warnings.is_empty());
        assert!(result.conf.is_none());
    }

    #[test]
    fn test_legacy_total_due_and_value_number() {
        let raw = json!({
            "analyzeResult": {
                "readResults": [],
                "documentResults": [{
                    "fields": {"TotalDue": {"valueNumber": 7.5}}
                }]
            }
        });
        let result = normalize(&raw, SchemaVariant::Legacy);
        assert_eq!(result.fields.total.as_deref(), Some("7.50"));
        assert!(result.fields.merchant.is_none());
    }

    #[test]
    fn test_legacy_bare_items_array() {
        let raw = json!({
            "analyzeResult": {
                "documentResults": [{
                    "fields": {"Items": [{"valueObject": {"Name": {"text": "Café"}, "TotalPrice": {"text": "2,10"}}}]}
                }]
            }
        });
        let result = normalize(&raw, SchemaVariant::Legacy);
        assert_eq!(result.fields.lignes.len(), 1);
        assert_eq!(result.fields.lignes[0].name.as_deref(), Some("Café"));
    }

    #[test]
    fn test_legacy_missing_height_gives_zero_y_norm() {
        let raw = json!({
            "analyzeResult": {
                "readResults": [{"lines": [{"text": "NETTO", "boundingBox": [0, 50, 0, 0]}]}]
            }
        });
        let result = normalize(&raw, SchemaVariant::Legacy);
        assert_eq!(result.meta.lines[0].y_norm, 0.0);
        assert_eq!(result.meta.lines[0].page, 1);
        assert_eq!(result.fields, OcrFields::default());
    }

    #[test]
    fn test_current_lines_and_fields() {
        let result = normalize(&current_payload(), SchemaVariant::Current);

        assert_eq!(result.meta.lines.len(), 2);
        assert!((result.meta.lines[0].y_norm - 0.05).abs() < 1e-9);
        assert!((result.meta.lines[1].y_norm - 0.1).abs() < 1e-9);
        assert!(result.texts.starts_with("Netto\n"));

        // content wins over valueString
        assert_eq!(result.fields.merchant.as_deref(), Some("NETTO"));
        assert_eq!(result.fields.date_achat.as_deref(), Some("01/05/2024"));
        assert_eq!(result.fields.total.as_deref(), Some("9,42"));
        assert_eq!(
            result.fields.lignes,
            vec![LineItem {
                name: Some("Pain".into()),
                price: Some("1,00".into())
            }]
        );
    }

    #[test]
    fn test_current_field_candidates() {
        let raw = json!({
            "documents": [{
                "fields": {
                    "VendorName": {"valueString": "Picard"},
                    "PurchaseDate": {"value": "2024-02-29"},
                    "TotalDue": {"value": 23.9}
                }
            }]
        });
        let result = normalize(&raw, SchemaVariant::Current);
        assert_eq!(result.fields.merchant.as_deref(), Some("Picard"));
        assert_eq!(result.fields.date_achat.as_deref(), Some("2024-02-29"));
        assert_eq!(result.fields.total.as_deref(), Some("23.9"));
        assert!(result.fields.lignes.is_empty());
    }

    #[test]
    fn test_current_envelope_and_flat_polygon() {
        let raw = json!({
            "status": "succeeded",
            "analyzeResult": {
                "content": "Lidl",
                "pages": [{"pageNumber": 2, "height": 10.0, "lines": [
                    {"content": "Lidl", "polygon": [0.5, 2.0, 3.0, 2.0]}
                ]}]
            }
        });
        let result = normalize(&raw, SchemaVariant::Current);
        assert_eq!(result.texts, "Lidl");
        assert_eq!(result.meta.lines[0].page, 2);
        assert!((result.meta.lines[0].y_norm - 0.2).abs() < 1e-9);
        assert_eq!(result.fields, OcrFields::default());
    }

    #[test]
    fn test_current_zero_height() {
        let raw = json!({
            "pages": [{"height": 0, "lines": [{"content": "x", "boundingPolygon": [{"x": 0, "y": 4}]}]}]
        });
        let result = normalize(&raw, SchemaVariant::Current);
        assert_eq!(result.meta.lines[0].y_norm, 0.0);
    }

    #[test]
    fn test_schema_mismatch() {
        let raw = json!({"pages": "not a list"});
        let result = normalize(&raw, SchemaVariant::Current);
        assert_eq!(result.warnings, vec!["schema_mismatch=current"]);
        assert!(result.meta.lines.is_empty());

        let raw = json!({"analyzeResult": {"readResults": 42}});
        let result = normalize(&raw, SchemaVariant::Legacy);
        assert_eq!(result.warnings, vec!["schema_mismatch=legacy"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for (raw, variant) in [
            (legacy_payload(), SchemaVariant::Legacy),
            (current_payload(), SchemaVariant::Current),
        ] {
            let first = normalize(&raw, variant);
            let second = normalize(&raw, variant);
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn test_parse_reports_variant() {
        let parsed = ProviderResponse::parse(&legacy_payload(), SchemaVariant::Legacy).unwrap();
        assert_eq!(parsed.variant(), SchemaVariant::Legacy);
    }
}
