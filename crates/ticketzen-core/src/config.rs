//! Pipeline configuration
//!
//! All tunables live in one `Config` with their defaults. Resolution order:
//! 1. Built-in defaults
//! 2. TOML file (explicit path, or ~/.local/share/ticketzen/config/ticketzen.toml)
//! 3. Environment overrides
//!
//! ```toml
//! [ocr]
//! endpoint = "https://example.cognitiveservices.azure.com"
//! route = "documentintelligence"
//! timeout_secs = 60
//!
//! [heuristics]
//! header_top_n = 15
//! ```
//!
//! Environment variables:
//! - `AZURE_DI_ENDPOINT`, `AZURE_DI_KEY`: provider endpoint and API key
//! - `AZURE_DI_ROUTE`: first route to try (default: formrecognizer_v21)
//! - `AZURE_DI_API_VERSION`: API version for that route (default: per route)
//! - `AZURE_DI_TIMEOUT_SEC`: request timeout (default: 90)
//! - `OCR_DRY_RUN`: skip the network and return the stub result (default: 0)
//! - `TICKETZEN_OCR_CLOUD_ENABLED`: cloud OCR switch (default: 1)
//! - `TICKETZEN_OCR_CLOUD_VENDOR`: provider vendor (default: azure)
//! - `TICKETZEN_DEBUG_DIR`: where debug artifacts are written (default: .)
//! - `TZ_HEADER_TOP_N`, `TZ_HEADER_MIN_SCORE`, `TZ_MERCHANT_MIN_SCORE`: heuristics

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::header::DEFAULT_TOP_N;
use crate::knowledge::DEFAULT_MIN_SCORE;
use crate::models::Route;

/// OCR provider call configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    pub endpoint: String,
    pub key: String,
    /// Route tried first; the others follow in priority order
    pub route: Route,
    /// API version for `route`; fallback routes use their own default
    pub api_version: Option<String>,
    pub timeout: Duration,
    pub dry_run: bool,
    pub cloud_enabled: bool,
    pub vendor: String,
    /// Directory receiving `last_azure.json` and `last_azure_meta.json`
    pub debug_dir: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            route: Route::FormRecognizerV21,
            api_version: None,
            timeout: Duration::from_secs(90),
            dry_run: false,
            cloud_enabled: true,
            vendor: "azure".to_string(),
            debug_dir: PathBuf::from("."),
        }
    }
}

impl OcrConfig {
    /// Whether the network call must be skipped in favour of the stub result
    pub fn is_offline(&self) -> bool {
        self.dry_run
            || !self.cloud_enabled
            || self.endpoint.trim().is_empty()
            || self.key.trim().is_empty()
    }

    /// API version to use when calling `route`
    pub fn api_version_for(&self, route: Route) -> &str {
        match &self.api_version {
            Some(version) if route == self.route && !version.is_empty() => version,
            _ => route.default_api_version(),
        }
    }
}

/// Thresholds for the header and merchant heuristics
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    /// Number of topmost lines considered for the merchant header
    pub header_top_n: usize,
    /// Reserved; not used by the current header heuristic
    pub header_min_score: u32,
    /// Fuzzy score (0-100) a merchant match must strictly exceed
    pub merchant_min_score: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            header_top_n: DEFAULT_TOP_N,
            header_min_score: 42,
            merchant_min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub ocr: OcrConfig,
    pub heuristics: HeuristicConfig,
}

impl Config {
    /// Load defaults, then the config file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                Self::from_toml_str(&fs::read_to_string(p)?)?
            }
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_toml_str(&fs::read_to_string(&p)?)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides (no config file)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(ocr) = raw.ocr {
            if let Some(endpoint) = ocr.endpoint {
                config.ocr.endpoint = endpoint;
            }
            if let Some(key) = ocr.key {
                config.ocr.key = key;
            }
            if let Some(route) = ocr.route {
                config.ocr.route = route.parse().map_err(Error::Config)?;
            }
            if let Some(version) = ocr.api_version {
                config.ocr.api_version = Some(version);
            }
            if let Some(timeout) = ocr.timeout_secs {
                config.ocr.timeout = Duration::from_secs(timeout);
            }
            if let Some(dry_run) = ocr.dry_run {
                config.ocr.dry_run = dry_run;
            }
            if let Some(enabled) = ocr.cloud_enabled {
                config.ocr.cloud_enabled = enabled;
            }
            if let Some(vendor) = ocr.vendor {
                config.ocr.vendor = vendor;
            }
            if let Some(dir) = ocr.debug_dir {
                config.ocr.debug_dir = dir;
            }
        }

        if let Some(heuristics) = raw.heuristics {
            if let Some(top_n) = heuristics.header_top_n {
                config.heuristics.header_top_n = top_n;
            }
            if let Some(score) = heuristics.header_min_score {
                config.heuristics.header_min_score = score;
            }
            if let Some(score) = heuristics.merchant_min_score {
                config.heuristics.merchant_min_score = score;
            }
        }

        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// Unparseable values keep the current setting and log a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let ocr = &mut self.ocr;
        if let Some(endpoint) = lookup("AZURE_DI_ENDPOINT") {
            ocr.endpoint = endpoint;
        }
        if let Some(key) = lookup("AZURE_DI_KEY") {
            ocr.key = key;
        }
        if let Some(route) = lookup("AZURE_DI_ROUTE") {
            match route.parse() {
                Ok(r) => ocr.route = r,
                Err(e) => warn!(error = %e, "Ignoring AZURE_DI_ROUTE"),
            }
        }
        if let Some(version) = lookup("AZURE_DI_API_VERSION") {
            ocr.api_version = Some(version);
        }
        if let Some(secs) = parse_env::<u64>(&lookup, "AZURE_DI_TIMEOUT_SEC") {
            ocr.timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = parse_flag(&lookup, "OCR_DRY_RUN") {
            ocr.dry_run = flag;
        }
        if let Some(flag) = parse_flag(&lookup, "TICKETZEN_OCR_CLOUD_ENABLED") {
            ocr.cloud_enabled = flag;
        }
        if let Some(vendor) = lookup("TICKETZEN_OCR_CLOUD_VENDOR") {
            ocr.vendor = vendor;
        }
        if let Some(dir) = lookup("TICKETZEN_DEBUG_DIR") {
            ocr.debug_dir = PathBuf::from(dir);
        }

        let heuristics = &mut self.heuristics;
        if let Some(top_n) = parse_env::<usize>(&lookup, "TZ_HEADER_TOP_N") {
            heuristics.header_top_n = top_n;
        }
        if let Some(score) = parse_env::<u32>(&lookup, "TZ_HEADER_MIN_SCORE") {
            heuristics.header_min_score = score;
        }
        if let Some(score) = parse_env::<f64>(&lookup, "TZ_MERCHANT_MIN_SCORE") {
            heuristics.merchant_min_score = score;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.heuristics.header_top_n == 0 {
            return Err(Error::Config("header_top_n must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.heuristics.merchant_min_score) {
            return Err(Error::Config(format!(
                "merchant_min_score must be between 0 and 100, got {}",
                self.heuristics.merchant_min_score
            )));
        }
        if self.ocr.timeout.is_zero() {
            return Err(Error::Config("OCR timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ticketzen").join("config").join("ticketzen.toml"))
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let value = lookup(name)?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %value, "Ignoring unparseable override");
            None
        }
    }
}

/// "0"/"1" style flags, also accepting true/false
fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let value = lookup(name)?;
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" | "" => Some(false),
        other => match other.parse::<i64>() {
            Ok(n) => Some(n != 0),
            Err(_) => {
                warn!(var = name, value = %value, "Ignoring unparseable flag");
                None
            }
        },
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    ocr: Option<RawOcr>,
    heuristics: Option<RawHeuristics>,
}

#[derive(Debug, Deserialize)]
struct RawOcr {
    endpoint: Option<String>,
    key: Option<String>,
    route: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
    dry_run: Option<bool>,
    cloud_enabled: Option<bool>,
    vendor: Option<String>,
    debug_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawHeuristics {
    header_top_n: Option<usize>,
    header_min_score: Option<u32>,
    merchant_min_score: Option<f64>,
}
