//! Bank description cleaning and merchant normalization
//!
//! Swiss bank exports bury the merchant name in payment boilerplate:
//! transaction numbers, IBAN labels, card-payment prefixes, postal
//! codes. The cleaner truncates at the first piece of boilerplate; the
//! normalizer reduces what remains to a short uppercase key suitable
//! for grouping and rule lookup.

use regex::Regex;

/// Labels that mark the end of the useful part of a description.
/// Everything from the first occurrence on is payment plumbing.
const STOP_TOKENS: [&str; 13] = [
    "No de transaction",
    "IBAN",
    "Motif du paiement",
    "Reference",
    "QRR",
    "Account no.",
    "Coûts:",
    "BIC/BC:",
    "Montant payé:",
    "Exchange rate:",
    "Paiement carte de debit",
    "Retrait au Bancomat",
    "Remboursement carte de debit",
];

/// Boilerplate phrases a multi-part description may consist of
/// entirely; a part matching one of these is not a merchant name.
const GENERIC_PHRASES: [&str; 6] = [
    "ordre global e-banking",
    "ordre e-banking",
    "paiement instantané",
    "credit référence qr",
    "divers ordres permanents",
    "solde décompte",
];

/// Cut a raw bank description down to its useful prefix.
///
/// Truncates at the first semicolon and at the first stop token (only
/// when they are not at position zero, so a description that starts
/// with a token keeps it), collapses whitespace and strips trailing
/// separators.
pub fn clean_bank_description(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    if cleaned.is_empty() {
        return cleaned;
    }

    if let Some(i) = cleaned.find(';').filter(|&i| i > 0) {
        cleaned.truncate(i);
    }

    for token in STOP_TOKENS {
        if let Some(i) = cleaned.find(token).filter(|&i| i > 0) {
            cleaned.truncate(i);
            break;
        }
    }

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_end_matches([';', '-']).trim().to_string()
}

/// Reduce a cleaned description to a normalized merchant key:
/// uppercase, digits and postal/country suffixes stripped, at most the
/// first two words longer than two characters.
///
/// When the word filter would empty the key entirely, the pre-filter
/// string is returned so short names still produce a stable key.
pub fn normalize_merchant(description: &str) -> String {
    let mut normalized = description.to_uppercase().trim().to_string();

    // "1305 PENTHALAZ"-style postal pairs must go before the digit
    // strip, which would otherwise erase the 4-digit half
    let postal_patterns = [r"\b\d{4}\s+[A-Z-]+$", r"\b[A-Z-]+\s+\d{4}$"];
    for pattern in postal_patterns {
        let re = Regex::new(pattern).expect("valid regex");
        normalized = re.replace(&normalized, "").into_owned();
    }

    let digits = Regex::new(r"\d+").expect("valid regex");
    normalized = digits.replace_all(&normalized, "").into_owned();

    // Country suffixes left behind by card terminals
    let country_patterns = [r"\sCH$", r"\sIT\s", r"\sDE\s", r"\sFR\s", r"\sBA\s", r"\sGB$"];
    for pattern in country_patterns {
        let re = Regex::new(pattern).expect("valid regex");
        normalized = re.replace(&normalized, "").into_owned();
    }

    normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized = normalized
        .trim_end_matches([',', ';', '.', '-'])
        .trim()
        .to_string();

    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();

    match words.len() {
        0 => normalized,
        1 | 2 => words.join(" "),
        _ => words[..2].join(" "),
    }
}

/// Pick the merchant name out of a multi-part description (UBS-style
/// "Description 1/2/3" columns).
///
/// The first cleaned part longer than three characters that is not
/// pure e-banking boilerplate wins. Otherwise the cleaned first part,
/// then the raw first part, then "Unknown".
pub fn extract_merchant_from_parts(parts: &[&str]) -> String {
    let parts: Vec<&str> = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        return "Unknown".to_string();
    }

    for part in &parts {
        let cleaned = clean_bank_description(part);
        if cleaned.chars().count() > 3 {
            let lower = cleaned.to_lowercase();
            let is_generic = GENERIC_PHRASES.iter().any(|term| lower.contains(term));
            if !is_generic {
                return cleaned;
            }
        }
    }

    let main = clean_bank_description(parts[0]);
    if !main.is_empty() {
        main
    } else {
        parts[0].to_string()
    }
}
