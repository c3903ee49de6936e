//! Rule-based transaction categorization
//!
//! The resolver chain for an imported line is: learned merchant rule,
//! then stored keyword rules, then the built-in Swiss keyword table,
//! then the fallback category. The built-in table is constant data;
//! only merchant and keyword rules live in the store.
//!
//! After an import, transactions that landed on the fallback category
//! are grouped by merchant key for a quick review pass; confirming a
//! group's category also upserts a merchant rule so the next import
//! categorizes that merchant directly.

use std::collections::HashMap;

use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::merchant::normalize_merchant;
use crate::models::{Category, KeywordRule};

/// One entry of the built-in Swiss keyword table. Lower priority wins
/// when several rules match the same text.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRule {
    pub keywords: &'static [&'static str],
    pub category: &'static str,
    pub priority: i64,
}

/// Built-in categorization rules for common Swiss merchants and
/// banking phrases. Matched as lowercase substrings.
pub const SWISS_CATEGORY_RULES: [BuiltinRule; 15] = [
    BuiltinRule {
        keywords: &["salaire", "salary", "lohn", "paie"],
        category: "Revenus",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["credit référence qr", "versement", "bonification", "virement recu"],
        category: "Revenus",
        priority: 2,
    },
    BuiltinRule {
        keywords: &["solde décompte", "décompte des prix"],
        category: "Frais bancaires",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["frais", "coûts", "e-banking", "banking fee"],
        category: "Frais bancaires",
        priority: 2,
    },
    BuiltinRule {
        keywords: &["migros", "coop", "aldi", "lidl", "denner", "manor food", "spar"],
        category: "Courses",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["station", "eni", "shell", "bp", "esso", "avanti", "tamoil", "essence"],
        category: "Transports",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["sbb", "cff", "ffs", "tl", "tpg", "postbus", "carpostal"],
        category: "Transports",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["pharmacie", "amavita", "benu", "apotheke", "sun store", "santé"],
        category: "Santé",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["fedex", "dhl", "post", "livraison", "courrier"],
        category: "Services",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["assurance", "insurance", "versicherung", "baloise", "axa", "zurich", "vaudoise"],
        category: "Assurances",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["loyer", "miete", "rent", "immobilier"],
        category: "Logement",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["restaurant", "cafe", "pizza", "mcdonalds", "burger"],
        category: "Restaurants",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["landi", "hornbach", "baumarkt", "bricolage", "obi", "jumbo"],
        category: "Maison",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["bmw", "garage", "auto", "voiture", "vehicle"],
        category: "Transports",
        priority: 1,
    },
    BuiltinRule {
        keywords: &["credit"],
        category: "Revenus",
        priority: 3,
    },
];

/// Match the built-in Swiss keyword table against a description plus
/// its raw full text. Returns the category name of the best (lowest
/// priority number) matching rule.
pub fn categorize_by_swiss_keywords(description: &str, full_text: &str) -> Option<&'static str> {
    let text = format!("{} {}", description, full_text).to_lowercase();

    let mut best: Option<(&'static str, i64)> = None;
    for rule in &SWISS_CATEGORY_RULES {
        if rule.keywords.iter().any(|kw| text.contains(kw)) {
            match best {
                Some((_, priority)) if rule.priority >= priority => {}
                _ => best = Some((rule.category, rule.priority)),
            }
        }
    }
    best.map(|(category, _)| category)
}

/// Find the fallback category: "Divers"/"Autres"/"Other"
/// (case-insensitive) if present, otherwise the first category by
/// name. An empty category table is a structural error.
pub fn fallback_category_id(categories: &[Category]) -> Result<i64> {
    if categories.is_empty() {
        return Err(Error::Import(
            "No categories found. Please create at least one category first.".to_string(),
        ));
    }

    let fallback = categories.iter().find(|c| {
        let name = c.name.to_lowercase();
        name == "divers" || name == "autres" || name == "other"
    });

    Ok(fallback.unwrap_or(&categories[0]).id)
}

/// Resolves category ids for imported lines. Loads the category list
/// and keyword rules once; merchant rules are looked up per line
/// because the review pass can add them mid-session.
pub struct Categorizer<'a> {
    db: &'a Database,
    fallback_id: i64,
    keyword_rules: Vec<KeywordRule>,
    categories_by_name: HashMap<String, i64>,
    apply_merchant_rules: bool,
}

impl<'a> Categorizer<'a> {
    pub fn new(db: &'a Database, apply_merchant_rules: bool) -> Result<Self> {
        let categories = db.list_categories(None)?;
        let fallback_id = fallback_category_id(&categories)?;
        let categories_by_name = categories
            .iter()
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect();
        let keyword_rules = db.list_keyword_rules()?;

        Ok(Self {
            db,
            fallback_id,
            keyword_rules,
            categories_by_name,
            apply_merchant_rules,
        })
    }

    pub fn fallback_id(&self) -> i64 {
        self.fallback_id
    }

    /// Resolve a category for one imported line.
    ///
    /// `description` is the cleaned merchant name, `raw_description`
    /// the joined original parts; keyword matching sees both.
    pub fn categorize(&self, description: &str, raw_description: &str) -> Result<i64> {
        if self.apply_merchant_rules {
            if let Some(id) = self.merchant_rule_category(description)? {
                return Ok(id);
            }
        }

        let text = format!("{} {}", description, raw_description).to_lowercase();

        // Stored rules are ordered by ascending priority; first hit wins
        for rule in &self.keyword_rules {
            if rule.keywords.iter().any(|kw| text.contains(&kw.to_lowercase())) {
                return Ok(rule.category_id);
            }
        }

        if let Some(name) = categorize_by_swiss_keywords(description, raw_description) {
            if let Some(&id) = self.categories_by_name.get(&name.to_lowercase()) {
                debug!("Built-in rule matched '{}' -> {}", description, name);
                return Ok(id);
            }
        }

        Ok(self.fallback_id)
    }

    /// Look up a learned merchant rule: exact key first, then a
    /// partial match on the key truncated to 30 characters.
    fn merchant_rule_category(&self, description: &str) -> Result<Option<i64>> {
        let key = normalize_merchant(description);
        if key.is_empty() {
            return Ok(None);
        }

        let rule = match self.db.find_merchant_rule(&key)? {
            Some(rule) => Some(rule),
            None => {
                let truncated: String = key.chars().take(30).collect();
                self.db.find_merchant_rule_partial(&truncated)?
            }
        };

        match rule {
            Some(rule) => {
                if rule.category_id.is_some() {
                    self.db.bump_merchant_rule_use(rule.id)?;
                }
                Ok(rule.category_id)
            }
            None => Ok(None),
        }
    }
}

/// Transactions from one import that landed on the fallback category,
/// grouped by normalized merchant key for the review pass.
#[derive(Debug, Clone)]
pub struct MerchantGroup {
    pub merchant_key: String,
    pub original_names: Vec<String>,
    pub transaction_ids: Vec<i64>,
    pub count: usize,
    pub selected_category_id: Option<i64>,
}

/// Group an import's still-uncategorized transactions by merchant key,
/// largest group first. Empty when the import left nothing on the
/// fallback category.
pub fn build_merchant_groups(db: &Database, import_file_id: i64) -> Result<Vec<MerchantGroup>> {
    let categories = db.list_categories(None)?;
    let Ok(fallback_id) = fallback_category_id(&categories) else {
        return Ok(Vec::new());
    };

    let transactions = db.transactions_for_import_file(import_file_id, Some(fallback_id))?;

    let mut groups: Vec<MerchantGroup> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for tx in transactions {
        let key = normalize_merchant(&tx.description);
        match by_key.get(&key) {
            Some(&idx) => {
                let group = &mut groups[idx];
                group.count += 1;
                group.transaction_ids.push(tx.id);
                if !group.original_names.contains(&tx.description) {
                    group.original_names.push(tx.description);
                }
            }
            None => {
                by_key.insert(key.clone(), groups.len());
                groups.push(MerchantGroup {
                    merchant_key: key,
                    original_names: vec![tx.description],
                    transaction_ids: vec![tx.id],
                    count: 1,
                    selected_category_id: None,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(groups)
}

/// Commit the review pass: for every group with a selected category,
/// update its transactions and upsert a merchant rule so future
/// imports learn the association. Returns the number of transactions
/// updated.
pub fn apply_merchant_groups(db: &Database, groups: &[MerchantGroup]) -> Result<usize> {
    let mut updated = 0;

    for group in groups {
        let Some(category_id) = group.selected_category_id else {
            continue;
        };

        updated += db.update_transactions_category(&group.transaction_ids, category_id)?;

        let display = group
            .original_names
            .first()
            .cloned()
            .unwrap_or_else(|| group.merchant_key.clone());
        db.upsert_merchant_rule(&group.merchant_key, &display, Some(category_id))?;
    }

    debug!("Review pass updated {} transactions", updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::TransactionKind;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            kind: TransactionKind::Expense,
            icon: None,
            color: None,
            parent_id: None,
            group_name: None,
            active: true,
            hidden: false,
            order_index: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_swiss_keywords_groceries() {
        assert_eq!(
            categorize_by_swiss_keywords("MIGROS LAUSANNE", ""),
            Some("Courses")
        );
        assert_eq!(categorize_by_swiss_keywords("Aldi Suisse 87", ""), Some("Courses"));
    }

    #[test]
    fn test_swiss_keywords_lower_priority_wins() {
        // "versement salaire" matches both the priority-1 salary rule
        // and the priority-2 transfer rule
        assert_eq!(
            categorize_by_swiss_keywords("Versement salaire", ""),
            Some("Revenus")
        );
        // "credit" alone only matches the weak priority-3 rule
        assert_eq!(categorize_by_swiss_keywords("credit", ""), Some("Revenus"));
    }

    #[test]
    fn test_swiss_keywords_searches_full_text_too() {
        assert_eq!(
            categorize_by_swiss_keywords("XZ-101", "achat PHARMACIE AMAVITA Lausanne"),
            Some("Santé")
        );
    }

    #[test]
    fn test_swiss_keywords_priority_tie_keeps_first_rule() {
        // "paiement" contains "paie" and hits the salary rule at the
        // same priority as "migros"; the earlier table entry wins
        assert_eq!(
            categorize_by_swiss_keywords("MIGROS LAUSANNE", "Paiement carte de debit"),
            Some("Revenus")
        );
    }

    #[test]
    fn test_swiss_keywords_no_match() {
        assert_eq!(categorize_by_swiss_keywords("ZZZZZ", ""), None);
    }

    #[test]
    fn test_fallback_prefers_divers() {
        let categories = vec![category(1, "Courses"), category(2, "Divers"), category(3, "Santé")];
        assert_eq!(fallback_category_id(&categories).unwrap(), 2);
    }

    #[test]
    fn test_fallback_case_insensitive_other() {
        let categories = vec![category(1, "Courses"), category(2, "OTHER")];
        assert_eq!(fallback_category_id(&categories).unwrap(), 2);
    }

    #[test]
    fn test_fallback_first_category_when_no_divers() {
        let categories = vec![category(7, "Courses"), category(8, "Santé")];
        assert_eq!(fallback_category_id(&categories).unwrap(), 7);
    }

    #[test]
    fn test_fallback_empty_is_error() {
        let err = fallback_category_id(&[]).unwrap_err();
        assert!(err
            .to_string()
            .contains("No categories found. Please create at least one category first."));
    }
}
