//! Merchant knowledge base and merchant name resolution
//!
//! The knowledge base is a catalog of canonical merchants with aliases,
//! identifying regex patterns and a default expense category. It is loaded
//! with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/ticketzen/config/merchants.yml)
//! 2. Fall back to the embedded catalog (compiled into binary)
//!
//! Resolution of a free-text candidate runs in two tiers:
//! - regex pass: the first pattern (file order) matching the original text wins
//! - fuzzy pass: best token-sort similarity against every alias and canonical
//!   name; it must be strictly greater than the threshold, otherwise the
//!   candidate is passed through unchanged
//!
//! Fuzzy ties keep the first merchant in file order, so catalog ordering matters.

mod similarity;

pub use similarity::token_sort_ratio;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default catalog (compiled into binary)
const DEFAULT_CATALOG: &str = include_str!("../../../../config/merchants.yml");

/// Default fuzzy threshold; a best score must be strictly greater to count
pub const DEFAULT_MIN_SCORE: f64 = 60.0;

/// A merchant entry as stored in the catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Canonical name, unique across the catalog
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Identifying patterns, matched case-insensitively
    #[serde(default)]
    pub regex: Vec<String>,
    #[serde(default)]
    pub default_category: Option<String>,
}

impl MerchantRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            regex: Vec::new(),
            default_category: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_regex(mut self, patterns: &[&str]) -> Self {
        self.regex = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.default_category = Some(category.to_string());
        self
    }
}

/// How a merchant name was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// A catalog regex matched the candidate
    Regex,
    /// Fuzzy similarity exceeded the threshold
    Fuzzy,
    /// Nothing matched; the candidate is returned as-is
    Passthrough,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Fuzzy => "fuzzy",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Result of resolving a candidate merchant name
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantMatch {
    /// Canonical name, or the original candidate for passthrough
    pub name: String,
    pub source: MatchSource,
    /// Best fuzzy score seen (None when the regex pass matched)
    pub score: Option<f64>,
}

/// Where the catalog was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Embedded,
    File(PathBuf),
    /// Built in memory (tests, callers supplying their own records)
    Records,
}

#[derive(Debug, Clone)]
struct CompiledMerchant {
    record: MerchantRecord,
    patterns: Vec<Regex>,
    /// Lowercased aliases followed by the lowercased canonical name
    fuzzy_keys: Vec<String>,
}

/// Raw catalog structure for YAML parsing
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    merchants: Vec<MerchantRecord>,
}

/// Read-only merchant catalog shared by every analysis
#[derive(Debug, Clone)]
pub struct MerchantKnowledgeBase {
    merchants: Vec<CompiledMerchant>,
    source: CatalogSource,
}

impl MerchantKnowledgeBase {
    /// Load from the default locations (override file, then embedded catalog)
    pub fn new() -> Self {
        Self::load(None)
    }

    /// Load from an explicit path, falling back to the default locations
    ///
    /// Never fails: an unreadable or malformed catalog yields an empty
    /// knowledge base, which makes every resolution a passthrough.
    pub fn load(path: Option<&Path>) -> Self {
        let source = resolve_source(path);
        let content = match &source {
            CatalogSource::File(p) => match fs::read_to_string(p) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "Failed to read merchant catalog, using empty catalog");
                    return Self::empty_from(source);
                }
            },
            _ => DEFAULT_CATALOG.to_string(),
        };

        match Self::from_yaml_str(&content) {
            Ok(kb) => {
                debug!(merchants = kb.len(), source = ?source, "Loaded merchant catalog");
                Self { source, ..kb }
            }
            Err(e) => {
                warn!(source = ?source, error = %e, "Malformed merchant catalog, using empty catalog");
                Self::empty_from(source)
            }
        }
    }

    /// Parse a YAML catalog (`merchants: [...]`)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::empty_from(CatalogSource::Records));
        }
        let raw: Option<RawCatalog> = serde_yaml::from_str(content)?;
        Ok(Self::from_records(raw.map(|r| r.merchants).unwrap_or_default()))
    }

    /// Build from records, keeping file order
    ///
    /// Records with an empty or duplicate name are dropped; invalid patterns
    /// are skipped. Both are logged.
    pub fn from_records(records: Vec<MerchantRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut merchants = Vec::with_capacity(records.len());

        for mut record in records {
            record.name = record.name.trim().to_string();
            let name = record.name.as_str();
            if name.is_empty() {
                warn!("Skipping merchant with empty name");
                continue;
            }
            if !seen.insert(name.to_string()) {
                warn!(merchant = %name, "Skipping duplicate merchant");
                continue;
            }

            let patterns = record
                .regex
                .iter()
                .filter_map(|p| match compile_pattern(p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(merchant = %name, pattern = %p, error = %e, "Skipping invalid merchant pattern");
                        None
                    }
                })
                .collect();

            let fuzzy_keys = record
                .aliases
                .iter()
                .chain(std::iter::once(&record.name))
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect();

            merchants.push(CompiledMerchant {
                record,
                patterns,
                fuzzy_keys,
            });
        }

        Self {
            merchants,
            source: CatalogSource::Records,
        }
    }

    /// Knowledge base with no merchants
    pub fn empty() -> Self {
        Self::empty_from(CatalogSource::Records)
    }

    fn empty_from(source: CatalogSource) -> Self {
        Self {
            merchants: Vec::new(),
            source,
        }
    }

    /// Re-read the catalog from where it was originally loaded
    ///
    /// In-memory catalogs are left untouched.
    pub fn reload(&mut self) {
        match self.source.clone() {
            CatalogSource::File(p) => *self = Self::load(Some(&p)),
            CatalogSource::Embedded => *self = Self::load(None),
            CatalogSource::Records => {}
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }

    /// Merchant records in catalog order
    pub fn records(&self) -> impl Iterator<Item = &MerchantRecord> {
        self.merchants.iter().map(|m| &m.record)
    }

    /// Resolve a candidate to a canonical merchant name with the default threshold
    pub fn resolve(&self, candidate: Option<&str>) -> Option<String> {
        self.resolve_with_threshold(candidate, DEFAULT_MIN_SCORE)
    }

    /// Resolve a candidate, requiring a fuzzy score strictly above `min_score`
    pub fn resolve_with_threshold(&self, candidate: Option<&str>, min_score: f64) -> Option<String> {
        self.resolve_detailed(candidate, min_score).map(|m| m.name)
    }

    /// Resolve a candidate and report how it was matched
    pub fn resolve_detailed(&self, candidate: Option<&str>, min_score: f64) -> Option<MerchantMatch> {
        let candidate = candidate?;
        if candidate.trim().is_empty() {
            return None;
        }

        if let Some(merchant) = self
            .merchants
            .iter()
            .find(|m| m.patterns.iter().any(|re| re.is_match(candidate)))
        {
            debug!(candidate = %candidate, merchant = %merchant.record.name, "Merchant matched by pattern");
            return Some(MerchantMatch {
                name: merchant.record.name.clone(),
                source: MatchSource::Regex,
                score: None,
            });
        }

        let normalized = candidate.trim().to_lowercase();
        let mut best: Option<&CompiledMerchant> = None;
        let mut best_score = 0.0;
        for merchant in &self.merchants {
            for key in &merchant.fuzzy_keys {
                let score = token_sort_ratio(&normalized, key);
                if score > best_score {
                    best_score = score;
                    best = Some(merchant);
                }
            }
        }

        match best {
            Some(merchant) if best_score > min_score => {
                debug!(candidate = %candidate, merchant = %merchant.record.name, score = best_score, "Merchant matched by similarity");
                Some(MerchantMatch {
                    name: merchant.record.name.clone(),
                    source: MatchSource::Fuzzy,
                    score: Some(best_score),
                })
            }
            _ => {
                debug!(candidate = %candidate, score = best_score, "No merchant match, passing candidate through");
                Some(MerchantMatch {
                    name: candidate.to_string(),
                    source: MatchSource::Passthrough,
                    score: Some(best_score),
                })
            }
        }
    }

    /// Default category of the merchant whose canonical name is exactly `name`
    pub fn default_category(&self, name: &str) -> Option<&str> {
        self.merchants
            .iter()
            .find(|m| m.record.name == name)
            .and_then(|m| m.record.default_category.as_deref())
    }
}

impl Default for MerchantKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Default catalog override path
pub fn default_catalog_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ticketzen").join("config").join("merchants.yml"))
}

/// Pick the catalog source (explicit path, then override file, then embedded)
fn resolve_source(path: Option<&Path>) -> CatalogSource {
    if let Some(p) = path {
        if p.exists() {
            return CatalogSource::File(p.to_path_buf());
        }
        warn!(path = %p.display(), "Merchant catalog not found, falling back to defaults");
    }
    match default_catalog_path() {
        Some(p) if p.exists() => CatalogSource::File(p),
        _ => CatalogSource::Embedded,
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(Error::from)
}
