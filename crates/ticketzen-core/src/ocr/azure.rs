//! Azure Document Intelligence backend
//!
//! Posts the document to each API route in fallback order and normalizes the
//! first non-empty response with that route's schema variant. A route that
//! errors, times out or answers with a non-2xx status is skipped.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::error::{Error, Result};
use crate::models::{CanonicalOcrResult, Route};

use super::normalize::normalize;
use super::OcrBackend;

/// Header carrying the subscription key
pub const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Debug artifact holding the last normalized result
pub const DEBUG_RESULT_FILE: &str = "last_azure.json";
/// Debug artifact holding the last result's line metadata
pub const DEBUG_META_FILE: &str = "last_azure_meta.json";

/// Azure backend with route fallback
#[derive(Clone)]
pub struct AzureBackend {
    http_client: Client,
    config: OcrConfig,
}

impl AzureBackend {
    /// Create a backend; the configured timeout bounds every request
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Full request URL for a route
    pub fn url_for(&self, route: Route) -> String {
        let path = route.api_path(self.config.api_version_for(route));
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn request(&self, route: Route, content: &[u8], content_type: &str) -> Result<Value> {
        let response = self
            .http_client
            .post(self.url_for(route))
            .header(KEY_HEADER, &self.config.key)
            .header(CONTENT_TYPE, content_type)
            .body(content.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "{} returned HTTP {}",
                route,
                status.as_u16()
            )));
        }

        Ok(response.json().await?)
    }

    /// Try every route in order; never fails
    pub async fn analyze_document(&self, content: &[u8], content_type: &str) -> CanonicalOcrResult {
        for route in Route::fallback_order(self.config.route) {
            let api_version = self.config.api_version_for(route);
            debug!(route = %route, api_version, "Trying OCR route");

            match self.request(route, content, content_type).await {
                Ok(response) if !is_empty_response(&response) => {
                    let mut result = normalize(&response, route.schema_variant());
                    result.warnings.push(format!("azure_route={}", route));
                    result.warnings.push(format!("azure_api={}", api_version));
                    info!(route = %route, lines = result.meta.lines.len(), "OCR route succeeded");
                    self.save_debug(&result);
                    return result;
                }
                Ok(_) => warn!(route = %route, "OCR route returned an empty response"),
                Err(e) => warn!(route = %route, error = %e, "OCR request failed"),
            }
        }

        warn!("All OCR routes failed");
        let result = CanonicalOcrResult::all_failed();
        self.save_debug(&result);
        result
    }

    fn save_debug(&self, result: &CanonicalOcrResult) {
        if let Err(e) = write_debug_artifacts(&self.config.debug_dir, result) {
            warn!(dir = %self.config.debug_dir.display(), error = %e, "Failed to write OCR debug artifacts");
        }
    }
}

#[async_trait]
impl OcrBackend for AzureBackend {
    async fn analyze(&self, content: &[u8], content_type: &str) -> Result<CanonicalOcrResult> {
        Ok(self.analyze_document(content, content_type).await)
    }

    fn vendor(&self) -> &str {
        &self.config.vendor
    }

    fn host(&self) -> &str {
        &self.config.endpoint
    }
}

/// Null, false, empty string, empty array or empty object
fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Write the result and its line metadata as pretty JSON into `dir`
pub fn write_debug_artifacts(dir: &Path, result: &CanonicalOcrResult) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(
        dir.join(DEBUG_RESULT_FILE),
        serde_json::to_string_pretty(result)?,
    )?;
    fs::write(
        dir.join(DEBUG_META_FILE),
        serde_json::to_string_pretty(&result.meta)?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OcrFields;
    use serde_json::json;

    fn config(endpoint: &str) -> OcrConfig {
        OcrConfig {
            endpoint: endpoint.to_string(),
            key: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for_routes() {
        let backend = AzureBackend::new(&config("https://tz.example.com/")).unwrap();
        assert_eq!(
            backend.url_for(Route::FormRecognizerV21),
            "https://tz.example.com/formrecognizer/v2.1/prebuilt/receipt/analyze?includeTextDetails=true"
        );
        assert_eq!(
            backend.url_for(Route::DocumentIntelligence),
            "https://tz.example.com/documentintelligence/documentModels/prebuilt-receipt:analyze?api-version=2024-07-31"
        );
    }

    #[test]
    fn test_empty_responses() {
        assert!(is_empty_response(&json!(null)));
        assert!(is_empty_response(&json!({})));
        assert!(is_empty_response(&json!([])));
        assert!(is_empty_response(&json!("")));
        assert!(!is_empty_response(&json!({"status": "succeeded"})));
    }

    #[test]
    fn test_write_debug_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = CanonicalOcrResult {
            fields: OcrFields {
                merchant: Some("Intermarché".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        write_debug_artifacts(dir.path(), &result).unwrap();

        let written = fs::read_to_string(dir.path().join(DEBUG_RESULT_FILE)).unwrap();
        assert!(written.contains("Intermarché"));
        assert!(written.contains('\n'));
        let meta: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(DEBUG_META_FILE)).unwrap())
                .unwrap();
        assert_eq!(meta, json!({"lines": []}));
    }

    #[test]
    fn test_write_debug_artifacts_into_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(write_debug_artifacts(file.path(), &CanonicalOcrResult::all_failed()).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_all_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config("http://127.0.0.1:9");
        cfg.debug_dir = dir.path().to_path_buf();
        cfg.timeout = std::time::Duration::from_secs(2);

        let backend = AzureBackend::new(&cfg).unwrap();
        let result = backend.analyze_document(b"jpeg", "image/jpeg").await;
        assert_eq!(result.warnings, vec!["azure_all_failed"]);
        assert!(dir.path().join(DEBUG_RESULT_FILE).exists());
    }
}
