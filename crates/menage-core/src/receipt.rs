//! Receipt text extraction
//!
//! Consumes the text output of an external OCR pass and extracts the
//! purchase amount, date and merchant with a confidence figure. All
//! heuristics are deterministic scoring passes; a miss degrades to
//! None (or today's date), never to an error.

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::models::DeductionType;

/// What could be read out of one receipt's OCR text
#[derive(Debug, Clone)]
pub struct ReceiptExtraction {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub merchant_raw: Option<String>,
    pub merchant_key: Option<String>,
    pub raw_text_snippet: String,
    /// 0..=100; 90 for a known Swiss merchant, 40 for a derived key
    pub confidence: u8,
}

/// Known Swiss merchants: (key, display name, lowercase keywords)
const SWISS_MERCHANTS: [(&str, &str, &[&str]); 22] = [
    ("COOP", "Coop", &["coop"]),
    ("MIGROS", "Migros", &["migros"]),
    ("MANOR", "Manor", &["manor"]),
    ("ALDI", "Aldi", &["aldi"]),
    ("LIDL", "Lidl", &["lidl"]),
    ("DENNER", "Denner", &["denner"]),
    ("IKEA", "Ikea", &["ikea"]),
    ("JUMBO", "Jumbo", &["jumbo"]),
    ("LANDI", "Landi", &["landi"]),
    ("AMAVITA", "Amavita", &["amavita"]),
    ("SUNSTORE", "Sun Store", &["sunstore", "sun store"]),
    ("TOPPHARM", "TopPharm", &["toppharm", "top pharm"]),
    ("APOTHEKE", "Pharmacie", &["apotheke", "pharmacie", "pharmacy"]),
    ("SHELL", "Shell", &["shell"]),
    ("ESSO", "Esso", &["esso"]),
    ("BP", "BP", &["bp"]),
    ("TAMOIL", "Tamoil", &["tamoil"]),
    ("AGROLA", "Agrola", &["agrola"]),
    ("SBB", "SBB CFF FFS", &["sbb", "cff", "ffs", "sbb cff ffs"]),
    ("MCDONALD", "McDonald's", &["mcdonald", "mcdo"]),
    ("BURGER_KING", "Burger King", &["burger king"]),
    ("SUBWAY", "Subway", &["subway"]),
];

/// Normalize a raw merchant line against the Swiss merchant catalog.
///
/// A catalog hit returns the canonical `{key, display}` at confidence
/// 90. Otherwise a key is derived from the first two significant
/// words at confidence 40.
pub fn normalize_receipt_merchant(raw: Option<&str>) -> (Option<String>, Option<String>, u8) {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (None, None, 0);
    };

    let symbols = Regex::new(r"[^\w\s]").expect("valid regex");
    let mut normalized: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect();
    normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized = symbols.replace_all(&normalized, "").into_owned();

    for (key, display, keywords) in SWISS_MERCHANTS {
        for keyword in keywords {
            if normalized.contains(&keyword.to_uppercase()) {
                return (Some(key.to_string()), Some(display.to_string()), 90);
            }
        }
    }

    let words: Vec<&str> = normalized
        .split(' ')
        .filter(|w| w.chars().count() > 2)
        .collect();
    if words.is_empty() {
        return (None, None, 0);
    }

    let key = words[..words.len().min(2)].join("_");
    let display = raw
        .split(' ')
        .take(3)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    (Some(key), Some(display), 40)
}

const AMOUNT_GROUP: &str = r"([0-9]{1,6}[\s',.]?[0-9]{0,3}[.,][0-9]{2})";

fn parse_matched_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect::<String>()
        .replace(',', ".");
    cleaned.parse::<f64>().ok()
}

/// Extract the purchase total from receipt text.
///
/// Three scored passes: amounts on lines carrying a total keyword win
/// outright; otherwise the largest currency-adjacent amount; as a last
/// resort the largest bare numeric amount above 0.50. Everything is
/// bounded to (0, 100000).
pub fn extract_amount_from_text(text: &str) -> Option<f64> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let total_keyword = Regex::new(
        r"(?i)TOTAL|MONTANT|SOMME|BETRAG|SUMME|ZAHLEN|PAYER|A\s*PAYER|TO\s*PAY|GESAMT",
    )
    .expect("valid regex");
    let total_patterns = [
        Regex::new(&format!(
            r"(?i)(?:TOTAL|MONTANT|SOMME|BETRAG|SUMME|SUM|AMOUNT|GESAMT|ZAHLEN|PAYER|A\s*PAYER|TO\s*PAY)\s*:?\s*(?:CHF|Fr\.?|FS|€|EUR)?\s*{}",
            AMOUNT_GROUP
        ))
        .expect("valid regex"),
        Regex::new(&format!(
            r"(?i)(?:CHF|Fr\.?|FS|€|EUR)\s*{}\s*(?:TOTAL|MONTANT|SOMME|BETRAG)",
            AMOUNT_GROUP
        ))
        .expect("valid regex"),
    ];
    let currency_patterns = [
        Regex::new(&format!(r"(?i)(?:CHF|Fr\.?|FS|€|EUR)\s*{}", AMOUNT_GROUP)).expect("valid regex"),
        Regex::new(&format!(r"(?i){}\s*(?:CHF|Fr\.?|FS|€|EUR)", AMOUNT_GROUP)).expect("valid regex"),
    ];
    let general_pattern =
        Regex::new(&format!(r"\b{}\b", AMOUNT_GROUP)).expect("valid regex");

    // Pass 1: totals
    let mut totals: Vec<f64> = Vec::new();
    for line in &lines {
        if !total_keyword.is_match(line) {
            continue;
        }
        for pattern in &total_patterns {
            for caps in pattern.captures_iter(line) {
                if let Some(amount) = parse_matched_amount(&caps[1]) {
                    if amount > 0.0 && amount < 100_000.0 {
                        totals.push(amount);
                    }
                }
            }
        }
    }
    if let Some(first) = totals.first() {
        return Some(*first);
    }

    // Pass 2: currency-adjacent, largest wins
    let mut amounts: Vec<f64> = Vec::new();
    for line in &lines {
        for pattern in &currency_patterns {
            for caps in pattern.captures_iter(line) {
                if let Some(amount) = parse_matched_amount(&caps[1]) {
                    if amount > 0.0 && amount < 100_000.0 {
                        amounts.push(amount);
                    }
                }
            }
        }
    }
    if !amounts.is_empty() {
        return amounts.into_iter().reduce(f64::max);
    }

    // Pass 3: bare numerics, stricter floor to dodge quantities
    let mut general: Vec<f64> = Vec::new();
    for line in &lines {
        for caps in general_pattern.captures_iter(line) {
            if let Some(amount) = parse_matched_amount(&caps[1]) {
                if amount > 0.50 && amount < 100_000.0 {
                    general.push(amount);
                }
            }
        }
    }
    general.into_iter().reduce(f64::max)
}

/// Extract the receipt date: the first `d.m.y`-looking match in the
/// text. Two-digit years are 2000-based; obviously swapped day/month
/// pairs are corrected. Falls back to today so a receipt without a
/// readable date still books.
pub fn extract_date_from_text(text: &str) -> NaiveDate {
    let pattern = Regex::new(r"(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})").expect("valid regex");

    if let Some(caps) = pattern.captures(text) {
        let mut day: u32 = caps[1].parse().unwrap_or(0);
        let mut month: u32 = caps[2].parse().unwrap_or(0);
        let mut year: i32 = caps[3].parse().unwrap_or(0);

        if year < 100 {
            year += 2000;
        }
        if day > 31 && month <= 12 {
            std::mem::swap(&mut day, &mut month);
        }

        if (1..=31).contains(&day) && (1..=12).contains(&month) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return date;
            }
        }
    }

    Local::now().date_naive()
}

/// Pick the merchant line out of the first ten lines of receipt text.
///
/// Lines are scored: early position, known Swiss merchant names and
/// uppercase-heavy text score up; digits and odd symbols score down.
/// Obvious non-name lines (phone numbers, tax lines, URLs, separator
/// art) are skipped entirely.
pub fn extract_merchant_from_text(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let ignore_words = Regex::new(
        r"(?i)^(ticket|reçu|receipt|kassenbon|bon|caisse|magasin|filiale|succursale|tel|fax|email|www|http|date|heure|time|merci|danke|thank|bienvenue|welcome|\d+)$",
    )
    .expect("valid regex");
    let avoid_patterns = [
        Regex::new(r"^\d+$").expect("valid regex"),
        Regex::new(r"^[0-9\s\-.()/]+$").expect("valid regex"),
        Regex::new(r"^\*+$").expect("valid regex"),
        Regex::new(r"^[\-=_]+$").expect("valid regex"),
        Regex::new(r"(?i)TVA|VAT|MWST|TAX").expect("valid regex"),
        Regex::new(r"(?i)@|\.com|\.ch|\.fr|\.de").expect("valid regex"),
    ];
    let weird_symbols = Regex::new(r"[<>{}\[\]\\|~`]").expect("valid regex");

    let mut candidates: Vec<(&str, i64, usize)> = Vec::new();

    for (i, line) in lines.iter().take(10).enumerate() {
        let len = line.chars().count();
        if !(2..=60).contains(&len) {
            continue;
        }
        if avoid_patterns.iter().any(|p| p.is_match(line)) {
            continue;
        }
        if ignore_words.is_match(line) {
            continue;
        }

        let mut score: i64 = (10 - i as i64) * 10;

        let upper_line = line.to_uppercase();
        if SWISS_MERCHANTS.iter().any(|(key, _, _)| upper_line.contains(key)) {
            score += 100;
        }

        let upper_count = line.chars().filter(|c| c.is_ascii_uppercase()).count();
        if upper_count * 2 >= len {
            score += 20;
        }

        let digit_count = line.chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count * 10 > len * 3 {
            score -= 30;
        }

        if (3..=25).contains(&len) {
            score += 15;
        }

        if weird_symbols.is_match(line) {
            score -= 20;
        }

        let word_count = line.split_whitespace().count();
        if (2..=4).contains(&word_count) {
            score += 10;
        }

        candidates.push((line, score, i));
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    match candidates.first() {
        Some(&(line, score, _)) if score > 0 => Some(line.to_string()),
        _ => Some(lines[0].to_string()),
    }
}

/// Run every extractor over one receipt's OCR text
pub fn extract_receipt_info(text: &str) -> ReceiptExtraction {
    let amount = extract_amount_from_text(text);
    let date = extract_date_from_text(text);
    let merchant_line = extract_merchant_from_text(text);
    let (merchant_key, merchant_display, confidence) =
        normalize_receipt_merchant(merchant_line.as_deref());

    let snippet: String = text.chars().take(1000).collect();

    ReceiptExtraction {
        amount,
        date: Some(date),
        merchant_raw: merchant_display.or(merchant_line),
        merchant_key,
        raw_text_snippet: snippet,
        confidence,
    }
}

/// Suggest a tax-deduction bucket from a merchant key: pharmacy-group
/// merchants count towards health costs. Everything else needs a
/// human decision.
pub fn suggest_deduction_type(merchant_key: Option<&str>) -> Option<DeductionType> {
    let key = merchant_key?;
    const HEALTH_KEYS: [&str; 4] = ["AMAVITA", "SUNSTORE", "TOPPHARM", "APOTHEKE"];

    if HEALTH_KEYS.iter().any(|k| key.contains(k)) {
        return Some(DeductionType::Health);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOP_RECEIPT: &str = "\
COOP Pronto Lausanne
Rue de Bourg 12
1003 Lausanne
TVA 123.456
Lait 2.50
Pain 1.95
TOTAL CHF 24.90
Merci de votre visite
15.03.2024 14:32";

    #[test]
    fn test_extract_amount_prefers_total_line() {
        assert_eq!(extract_amount_from_text(COOP_RECEIPT), Some(24.90));
    }

    #[test]
    fn test_extract_amount_currency_fallback_takes_largest() {
        let text = "CHF 5.00\nCHF 89.90\nCHF 12.30";
        assert_eq!(extract_amount_from_text(text), Some(89.90));
    }

    #[test]
    fn test_extract_amount_general_floor() {
        // 0.30 is below the bare-numeric floor, 4.20 is not
        let text = "qty 0.30\nitem 4.20";
        assert_eq!(extract_amount_from_text(text), Some(4.20));
    }

    #[test]
    fn test_extract_amount_respects_upper_bound() {
        assert_eq!(extract_amount_from_text("TOTAL 999999.00"), None);
    }

    #[test]
    fn test_extract_amount_apostrophe_grouping() {
        assert_eq!(extract_amount_from_text("TOTAL CHF 1'234.50"), Some(1234.50));
    }

    #[test]
    fn test_extract_amount_none_without_numbers() {
        assert_eq!(extract_amount_from_text("no numbers here"), None);
    }

    #[test]
    fn test_extract_date_swiss_format() {
        let date = extract_date_from_text(COOP_RECEIPT);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_extract_date_two_digit_year() {
        let date = extract_date_from_text("01.02.24");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_extract_date_fallback_is_today() {
        assert_eq!(extract_date_from_text("no date"), Local::now().date_naive());
    }

    #[test]
    fn test_extract_merchant_known_name_wins() {
        let merchant = extract_merchant_from_text(COOP_RECEIPT).unwrap();
        assert_eq!(merchant, "COOP Pronto Lausanne");
    }

    #[test]
    fn test_extract_merchant_skips_boilerplate_lines() {
        let text = "*****\n0791234567\nBoulangerie Dupont\nTVA 8.1%";
        assert_eq!(
            extract_merchant_from_text(text).unwrap(),
            "Boulangerie Dupont"
        );
    }

    #[test]
    fn test_normalize_receipt_merchant_catalog_hit() {
        let (key, display, confidence) = normalize_receipt_merchant(Some("MIGROS M LAUSANNE 042"));
        assert_eq!(key.as_deref(), Some("MIGROS"));
        assert_eq!(display.as_deref(), Some("Migros"));
        assert_eq!(confidence, 90);
    }

    #[test]
    fn test_normalize_receipt_merchant_derived_key() {
        let (key, display, confidence) = normalize_receipt_merchant(Some("Boulangerie Dupont Fils"));
        assert_eq!(key.as_deref(), Some("BOULANGERIE_DUPONT"));
        assert_eq!(display.as_deref(), Some("Boulangerie Dupont Fils"));
        assert_eq!(confidence, 40);
    }

    #[test]
    fn test_normalize_receipt_merchant_empty() {
        let (key, display, confidence) = normalize_receipt_merchant(None);
        assert!(key.is_none());
        assert!(display.is_none());
        assert_eq!(confidence, 0);
    }

    #[test]
    fn test_extract_receipt_info_full() {
        let info = extract_receipt_info(COOP_RECEIPT);
        assert_eq!(info.amount, Some(24.90));
        assert_eq!(info.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(info.merchant_key.as_deref(), Some("COOP"));
        assert_eq!(info.merchant_raw.as_deref(), Some("Coop"));
        assert_eq!(info.confidence, 90);
    }

    #[test]
    fn test_suggest_deduction_pharmacy_is_health() {
        assert_eq!(
            suggest_deduction_type(Some("AMAVITA")),
            Some(DeductionType::Health)
        );
        assert_eq!(
            suggest_deduction_type(Some("APOTHEKE")),
            Some(DeductionType::Health)
        );
    }

    #[test]
    fn test_suggest_deduction_none_for_groceries() {
        assert_eq!(suggest_deduction_type(Some("MIGROS")), None);
        assert_eq!(suggest_deduction_type(None), None);
    }
}
