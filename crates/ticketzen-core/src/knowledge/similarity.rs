//! Token-order-insensitive string similarity
//!
//! Scores are on a 0-100 scale. Tokens are split on whitespace and sorted
//! before comparing, so "LECLERC E" and "E LECLERC" score 100. The underlying
//! ratio is `rapidfuzz`'s normalized Indel similarity (insertions and
//! deletions only).

/// Similarity of two strings after sorting their whitespace-separated tokens
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
