//! Merchant header detection from spatial line layout
//!
//! The shop name is usually printed near the top of a receipt, but the street
//! address often sits right next to it. Address-looking lines are skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Line;

/// Default number of topmost lines considered as header candidates
pub const DEFAULT_TOP_N: usize = 20;

const ADDRESS_HINTS: &[&str] = &[
    "avenue", "av.", "rue", "boulevard", "bd", "impasse", "chemin", "route", "bp", "boite",
    "boîte",
];

/// Postal-code-like digit groups ("75 011")
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}\s\d{3}").expect("valid regex"));

/// Check whether a line looks like part of a postal address
pub fn looks_like_address(text: &str) -> bool {
    let lower = text.to_lowercase();
    ADDRESS_HINTS.iter().any(|hint| lower.contains(hint)) || POSTAL_CODE.is_match(&lower)
}

/// Pick the most likely merchant-name line
///
/// Lines are ranked top to bottom by `y_norm` and only the first `top_n` are
/// considered. Returns the first one that is not an address, or the topmost
/// line when they all look like addresses.
pub fn extract_header(lines: &[Line], top_n: usize) -> Option<String> {
    let mut candidates: Vec<&Line> = lines.iter().collect();
    // Stable sort keeps reading order for lines on the same row
    candidates.sort_by(|a, b| a.y_norm.total_cmp(&b.y_norm));
    candidates.truncate(top_n);

    candidates
        .iter()
        .find(|line| !looks_like_address(&line.text))
        .or_else(|| candidates.first())
        .map(|line| line.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, y_norm: f64) -> Line {
        Line {
            text: text.to_string(),
            y_norm,
            page: 1,
        }
    }

    #[test]
    fn test_address_detection() {
        assert!(looks_like_address("12 Rue de la Paix"));
        assert!(looks_like_address("AVENUE DES CHAMPS"));
        assert!(looks_like_address("Bd Haussmann"));
        assert!(looks_like_address("75 011 Paris"));
        assert!(looks_like_address("BP 42"));
        assert!(looks_like_address("Boîte postale 7"));
        assert!(!looks_like_address("Netto"));
        assert!(!looks_like_address("CARREFOUR CITY"));
        assert!(!looks_like_address("Tel 0145"));
    }

    #[test]
    fn test_skips_address_above_shop_name() {
        let lines = vec![
            line("GAMM VERT", 0.10),
            line("3 rue du Moulin", 0.02),
            line("Total 12,00", 0.80),
        ];
        assert_eq!(extract_header(&lines, 20), Some("GAMM VERT".to_string()));
    }

    #[test]
    fn test_topmost_line_wins() {
        let lines = vec![
            line("Merci de votre visite", 0.95),
            line("Netto", 0.05),
            line("Pain 1,00", 0.40),
        ];
        assert_eq!(extract_header(&lines, 20), Some("Netto".to_string()));
    }

    #[test]
    fn test_all_addresses_falls_back_to_first() {
        let lines = vec![
            line("Chemin des Vignes", 0.20),
            line("12 avenue Foch", 0.10),
        ];
        assert_eq!(extract_header(&lines, 20), Some("12 avenue Foch".to_string()));
    }

    #[test]
    fn test_top_n_limits_candidates() {
        let lines = vec![
            line("1 rue A", 0.01),
            line("2 rue B", 0.02),
            line("SUPER U", 0.03),
        ];
        // SUPER U is outside the top 2, so the address fallback applies
        assert_eq!(extract_header(&lines, 2), Some("1 rue A".to_string()));
        assert_eq!(extract_header(&lines, 3), Some("SUPER U".to_string()));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_header(&[], 20), None);
        assert_eq!(extract_header(&[line("Netto", 0.1)], 0), None);
    }

    #[test]
    fn test_equal_positions_keep_input_order() {
        let lines = vec![line("LIDL", 0.0), line("ALDI", 0.0)];
        assert_eq!(extract_header(&lines, 20), Some("LIDL".to_string()));
    }
}
