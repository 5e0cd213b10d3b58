//! Expense category assignment
//!
//! Priority: knowledge base default category → keyword heuristics → "divers"

use crate::knowledge::MerchantKnowledgeBase;

/// Category used when nothing else applies
pub const GENERIC_DEFAULT: &str = "divers";

/// Keyword groups checked in order against the lowercased merchant name
const KEYWORD_CATEGORIES: &[(&[&str], &str)] = &[
    (&["fnac", "darty"], "électronique"),
    (&["restaurant", "café", "bistro"], "restauration"),
];

/// Map a resolved merchant name to an expense category (never empty)
pub fn categorize(kb: &MerchantKnowledgeBase, merchant: Option<&str>) -> String {
    let Some(merchant) = merchant.filter(|m| !m.is_empty()) else {
        return GENERIC_DEFAULT.to_string();
    };

    if let Some(category) = kb.default_category(merchant).filter(|c| !c.is_empty()) {
        return category.to_string();
    }

    keyword_category(merchant)
        .unwrap_or(GENERIC_DEFAULT)
        .to_string()
}

fn keyword_category(merchant: &str) -> Option<&'static str> {
    let lower = merchant.to_lowercase();
    KEYWORD_CATEGORIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::MerchantRecord;

    fn kb() -> MerchantKnowledgeBase {
        MerchantKnowledgeBase::from_records(vec![
            MerchantRecord::new("Netto").with_category("alimentation"),
            MerchantRecord::new("Café de Flore").with_category("sorties"),
            MerchantRecord::new("Sans Catégorie"),
        ])
    }

    #[test]
    fn test_knowledge_base_category_first() {
        assert_eq!(categorize(&kb(), Some("Netto")), "alimentation");
        // KB default beats the "café" keyword
        assert_eq!(categorize(&kb(), Some("Café de Flore")), "sorties");
    }

    #[test]
    fn test_keyword_fallback() {
        let kb = MerchantKnowledgeBase::empty();
        assert_eq!(categorize(&kb, Some("Fnac")), "électronique");
        assert_eq!(categorize(&kb, Some("DARTY Rennes")), "électronique");
        assert_eq!(categorize(&kb, Some("Restaurant Chez Paul")), "restauration");
        assert_eq!(categorize(&kb, Some("LE BISTRO DU COIN")), "restauration");
        assert_eq!(categorize(&kb, Some("CAFÉ DES ARTS")), "restauration");
    }

    #[test]
    fn test_electronics_checked_before_dining() {
        let kb = MerchantKnowledgeBase::empty();
        assert_eq!(categorize(&kb, Some("Café Fnac")), "électronique");
    }

    #[test]
    fn test_merchant_without_category_uses_keywords() {
        assert_eq!(categorize(&kb(), Some("Sans Catégorie")), "divers");
    }

    #[test]
    fn test_generic_default() {
        let kb = kb();
        assert_eq!(categorize(&kb, None), "divers");
        assert_eq!(categorize(&kb, Some("")), "divers");
        assert_eq!(categorize(&kb, Some("Boulangerie Paul")), "divers");
    }
}
