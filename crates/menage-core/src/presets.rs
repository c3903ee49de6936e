//! Bank preset detection and column mapping
//!
//! A preset describes one bank's CSV export: the header tokens that
//! identify it, the dialect hints, and candidate header patterns for
//! each logical statement field. Detection and mapping are pure
//! functions over a preset catalog loaded from the store; the built-in
//! catalog below is installed at migration time.

use tracing::debug;

use crate::models::{BankPreset, ColumnMapping, DecimalSeparator, PresetMapping};

/// A built-in preset before it is installed into the store
#[derive(Debug, Clone)]
pub struct PresetSeed {
    pub name: &'static str,
    pub match_headers: &'static [&'static str],
    pub delimiter_hint: char,
    pub date_format_hint: &'static str,
    pub decimal_separator_hint: DecimalSeparator,
    pub mapping: PresetMapping,
    pub order_index: i64,
}

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// The built-in preset catalog for common Swiss bank exports, in
/// detection order. "Generic" is last and is the universal fallback.
pub fn builtin_presets() -> Vec<PresetSeed> {
    vec![
        PresetSeed {
            name: "UBS",
            match_headers: &[
                "Date de comptabilisation",
                "Description 1",
                "Description 2",
                "Description 3",
                "No de transaction",
            ],
            delimiter_hint: ';',
            date_format_hint: "%d.%m.%Y",
            decimal_separator_hint: DecimalSeparator::Dot,
            mapping: PresetMapping {
                date: patterns(&["Date de comptabilisation", "Booking date", "Date"]),
                description: patterns(&["Description 1", "Text"]),
                description2: patterns(&["Description 2"]),
                description3: patterns(&["Description 3"]),
                amount: vec![],
                debit: patterns(&["Débit", "Debit"]),
                credit: patterns(&["Crédit", "Credit"]),
                currency: patterns(&["Monnaie", "Currency"]),
                balance: patterns(&["Solde", "Balance"]),
                value_date: patterns(&["Date de valeur", "Value date"]),
                reference: patterns(&["No de transaction", "Transaction no."]),
            },
            order_index: 0,
        },
        PresetSeed {
            name: "PostFinance",
            match_headers: &[
                "Date de comptabilisation",
                "Libellé",
                "Crédit en CHF",
                "Débit en CHF",
            ],
            delimiter_hint: ';',
            date_format_hint: "%d.%m.%Y",
            decimal_separator_hint: DecimalSeparator::Dot,
            mapping: PresetMapping {
                date: patterns(&["Date de comptabilisation", "Date"]),
                description: patterns(&["Libellé", "Notification de texte"]),
                description2: vec![],
                description3: vec![],
                amount: vec![],
                debit: patterns(&["Débit"]),
                credit: patterns(&["Crédit"]),
                currency: vec![],
                balance: patterns(&["Solde"]),
                value_date: patterns(&["Date de valeur"]),
                reference: patterns(&["Numéro de transaction"]),
            },
            order_index: 1,
        },
        PresetSeed {
            name: "Raiffeisen",
            match_headers: &["Booked At", "Text", "Credit/Debit Amount", "Value Date"],
            delimiter_hint: ';',
            date_format_hint: "%Y-%m-%d",
            decimal_separator_hint: DecimalSeparator::Dot,
            mapping: PresetMapping {
                date: patterns(&["Booked At"]),
                description: patterns(&["Text"]),
                description2: vec![],
                description3: vec![],
                amount: patterns(&["Credit/Debit Amount"]),
                debit: vec![],
                credit: vec![],
                currency: vec![],
                balance: patterns(&["Balance"]),
                value_date: patterns(&["Value Date"]),
                reference: vec![],
            },
            order_index: 2,
        },
        PresetSeed {
            name: "BCV",
            match_headers: &["Date d'opération", "Date de valeur", "Libellé", "Solde"],
            delimiter_hint: ';',
            date_format_hint: "%d.%m.%Y",
            decimal_separator_hint: DecimalSeparator::Dot,
            mapping: PresetMapping {
                date: patterns(&["Date d'opération", "Date"]),
                description: patterns(&["Libellé"]),
                description2: vec![],
                description3: vec![],
                amount: vec![],
                debit: patterns(&["Débit"]),
                credit: patterns(&["Crédit"]),
                currency: vec![],
                balance: patterns(&["Solde"]),
                value_date: patterns(&["Date de valeur"]),
                reference: vec![],
            },
            order_index: 3,
        },
        PresetSeed {
            name: "Generic",
            match_headers: &[],
            delimiter_hint: ',',
            date_format_hint: "%Y-%m-%d",
            decimal_separator_hint: DecimalSeparator::Dot,
            mapping: PresetMapping {
                date: patterns(&["date", "datum", "data"]),
                description: patterns(&["description", "libellé", "libelle", "text", "détails"]),
                description2: vec![],
                description3: vec![],
                amount: patterns(&["amount", "montant", "betrag"]),
                debit: patterns(&["débit", "debit", "soll"]),
                credit: patterns(&["crédit", "credit", "haben"]),
                currency: patterns(&["currency", "monnaie", "devise", "währung"]),
                balance: patterns(&["balance", "solde", "saldo"]),
                value_date: patterns(&["value date", "date de valeur", "valuta"]),
                reference: patterns(&["reference", "référence", "no de transaction"]),
            },
            order_index: 99,
        },
    ]
}

/// Pick the preset matching a statement's headers.
///
/// A preset matches when at least half of its match-header tokens
/// appear (case-insensitive substring) among the input headers. The
/// catalog is walked in order and the first match wins; "Generic"
/// never pattern-matches and is returned when nothing else does.
pub fn detect_preset<'a>(headers: &[String], presets: &'a [BankPreset]) -> Option<&'a BankPreset> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    for preset in presets {
        if preset.is_generic() || preset.match_headers.is_empty() {
            continue;
        }

        let matched = preset
            .match_headers
            .iter()
            .filter(|pattern| {
                let pattern = pattern.to_lowercase();
                normalized.iter().any(|h| h.contains(&pattern))
            })
            .count();

        let ratio = matched as f64 / preset.match_headers.len() as f64;
        if ratio >= 0.5 {
            debug!(
                "Detected preset '{}' ({}/{} header tokens)",
                preset.name,
                matched,
                preset.match_headers.len()
            );
            return Some(preset);
        }
    }

    presets.iter().find(|p| p.is_generic())
}

/// Find the header matching a list of candidate patterns: for each
/// pattern in order, an exact case-insensitive match wins over a
/// substring match; the first pattern with any hit decides.
fn resolve_field(headers: &[String], candidates: &[String]) -> Option<String> {
    for pattern in candidates {
        let pattern = pattern.to_lowercase();

        let exact = headers
            .iter()
            .find(|h| h.trim().to_lowercase() == pattern);
        if let Some(h) = exact {
            return Some(h.trim().to_string());
        }

        let partial = headers
            .iter()
            .find(|h| h.trim().to_lowercase().contains(&pattern));
        if let Some(h) = partial {
            return Some(h.trim().to_string());
        }
    }
    None
}

/// Resolve a preset's candidate patterns against concrete headers.
/// Fields with no matching header stay None.
pub fn map_columns(headers: &[String], preset: Option<&BankPreset>) -> ColumnMapping {
    let Some(preset) = preset else {
        return ColumnMapping::default();
    };

    let m = &preset.mapping;
    ColumnMapping {
        date: resolve_field(headers, &m.date),
        description: resolve_field(headers, &m.description),
        description2: resolve_field(headers, &m.description2),
        description3: resolve_field(headers, &m.description3),
        amount: resolve_field(headers, &m.amount),
        debit: resolve_field(headers, &m.debit),
        credit: resolve_field(headers, &m.credit),
        currency: resolve_field(headers, &m.currency),
        balance: resolve_field(headers, &m.balance),
        value_date: resolve_field(headers, &m.value_date),
        reference: resolve_field(headers, &m.reference),
    }
}

/// Outcome of validating a column mapping. Violations are collected,
/// not short-circuited, so the caller can show all of them at once.
#[derive(Debug, Clone, Default)]
pub struct MappingValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A mapping is usable iff it has a date column, a description column,
/// and either an amount column or at least one of debit/credit.
pub fn validate_mapping(mapping: &ColumnMapping) -> MappingValidation {
    let mut errors = Vec::new();

    if mapping.date.is_none() {
        errors.push("Date column is required".to_string());
    }

    if mapping.description.is_none() {
        errors.push("Description column is required".to_string());
    }

    let has_amount = mapping.amount.is_some();
    let has_debit_credit = mapping.debit.is_some() || mapping.credit.is_some();
    if !has_amount && !has_debit_credit {
        errors.push("Amount column or Debit/Credit columns are required".to_string());
    }

    MappingValidation {
        valid: errors.is_empty(),
        errors,
    }
}
