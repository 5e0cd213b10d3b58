//! French receipt field parsing
//!
//! Amounts and dates come out of OCR as free text ("9,42 €", "1 234,56",
//! "01/05/2024"). These helpers never fail: `None` means "unparseable".

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static DECIMAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+[.,][0-9]{2})").expect("valid regex"));

/// Date formats tried in order; the first one that parses wins
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];

/// Glyphs stripped before looking for digits. Includes the UTF-8 euro sign
/// mis-decoded as Windows-1252, which some OCR exports produce.
const STRIPPED_GLYPHS: &[&str] = &["€", "â‚¬", "'", "\u{2019}"];

/// Parse a French-formatted monetary amount
///
/// Accepts comma or dot as decimal separator and ignores spaces, euro signs
/// and apostrophe thousands separators. A bare run of digits is read as cents,
/// since OCR frequently drops the separator ("942" is 9.42). Line breaks are
/// kept so numbers on adjacent OCR lines stay apart.
pub fn parse_amount_fr(text: &str) -> Option<f64> {
    let mut cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !is_horizontal_space(*c))
        .collect();
    for glyph in STRIPPED_GLYPHS {
        cleaned = cleaned.replace(glyph, "");
    }
    if cleaned.is_empty() {
        return None;
    }

    match DECIMAL_AMOUNT.captures(&cleaned) {
        Some(caps) => caps[1].replace(',', ".").parse::<f64>().ok(),
        None if cleaned.chars().all(|c| c.is_ascii_digit()) => {
            cleaned.parse::<f64>().ok().map(|cents| cents / 100.0)
        }
        None => None,
    }
}

fn is_horizontal_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{a0}' | '\u{202f}')
}

/// Parse a receipt date in one of the common French layouts
pub fn parse_date_fr(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_amount(input: &str, expected: f64) {
        let parsed = parse_amount_fr(input).unwrap_or_else(|| panic!("{:?} did not parse", input));
        assert!(
            (parsed - expected).abs() < 1e-9,
            "{:?} parsed as {}, expected {}",
            input,
            parsed,
            expected
        );
    }

    #[test]
    fn test_amount_decimal_separators() {
        assert_amount("9,42", 9.42);
        assert_amount("12.34", 12.34);
        assert_amount("  9,42 € ", 9.42);
    }

    #[test]
    fn test_amount_missing_separator_is_cents() {
        assert_amount("942", 9.42);
        assert_amount("100", 1.0);
    }

    #[test]
    fn test_amount_thousands_separators() {
        assert_amount("1 234,56", 1234.56);
        assert_amount("1'234,56", 1234.56);
        assert_amount("1\u{a0}234,56 EUR", 1234.56);
    }

    #[test]
    fn test_amount_mis_decoded_euro() {
        assert_amount("9,42â‚¬", 9.42);
    }

    #[test]
    fn test_amount_embedded_in_text() {
        assert_amount("TOTAL TTC 23,90", 23.90);
        assert_amount("Netto\n01/05/2024\nTotal 9,42", 9.42);
    }

    #[test]
    fn test_amount_does_not_join_lines() {
        assert_amount("Caisse 12\n3,50", 3.50);
        assert_amount("Ticket 0042\r\nTOTAL 17,80", 17.80);
        assert_eq!(parse_amount_fr("12\n34"), None);
    }

    #[test]
    fn test_amount_without_digits_is_none() {
        for input in ["", "   ", "€", "TOTAL", "abc,de", "n/a"] {
            assert_eq!(parse_amount_fr(input), None, "input {:?}", input);
        }
    }

    #[test]
    fn test_amount_malformed_digits_is_none() {
        assert_eq!(parse_amount_fr("12,3"), None);
        assert_eq!(parse_amount_fr("-"), None);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_date_fr("01/05/2024"), Some(expected));
        assert_eq!(parse_date_fr("2024-05-01"), Some(expected));
        assert_eq!(parse_date_fr("01-05-2024"), Some(expected));
        assert_eq!(parse_date_fr("01.05.2024"), Some(expected));
        assert_eq!(parse_date_fr(" 01/05/2024 "), Some(expected));
    }

    #[test]
    fn test_date_is_day_first() {
        assert_eq!(
            parse_date_fr("02/03/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn test_date_unparseable() {
        assert_eq!(parse_date_fr("le 1er mai"), None);
        assert_eq!(parse_date_fr(""), None);
        assert_eq!(parse_date_fr("31/02/2024"), None);
    }

    #[test]
    fn test_date_iso_output() {
        let date = parse_date_fr("15.08.2023").unwrap();
        assert_eq!(date.to_string(), "2023-08-15");
    }
}
