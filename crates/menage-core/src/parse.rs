//! Low-level statement parsing
//!
//! Byte-level encoding detection, CSV dialect heuristics and cell
//! parsing for amounts and dates. Everything here is tolerant: bad
//! cells degrade to defaults instead of failing the whole file.

use chrono::NaiveDate;
use encoding_rs::{UTF_8, WINDOWS_1252};
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::models::DecimalSeparator;

/// How many leading bytes the UTF-8 validity scan inspects
const ENCODING_SCAN_LIMIT: usize = 4000;

/// Date patterns tried when detecting or parsing statement dates.
/// Swiss day-first formats come before the ambiguous US layout.
pub const DATE_FORMATS: [&str; 5] = ["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Detected text encoding of a statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf8,
    Windows1252,
}

impl DetectedEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedEncoding::Utf8 => "utf-8",
            DetectedEncoding::Windows1252 => "windows-1252",
        }
    }
}

impl std::fmt::Display for DetectedEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guess the encoding of raw statement bytes.
///
/// A UTF-8 BOM decides immediately. Otherwise the first
/// [`ENCODING_SCAN_LIMIT`] bytes are scanned, counting well-formed
/// multi-byte UTF-8 sequences against malformed high bytes. Pure ASCII
/// is UTF-8; valid sequences outnumbering invalid ones more than 2:1
/// is UTF-8; anything else falls back to Windows-1252, which Swiss
/// banks still emit routinely.
pub fn detect_encoding(bytes: &[u8]) -> DetectedEncoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return DetectedEncoding::Utf8;
    }

    let scan = &bytes[..bytes.len().min(ENCODING_SCAN_LIMIT)];

    let mut has_high_bytes = false;
    let mut valid = 0usize;
    let mut invalid = 0usize;

    let mut i = 0;
    while i < scan.len() {
        let b = scan[i];
        if b < 0x80 {
            i += 1;
            continue;
        }
        has_high_bytes = true;

        let seq_len = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => {
                // Stray continuation or invalid lead byte
                invalid += 1;
                i += 1;
                continue;
            }
        };

        match scan.get(i + 1..i + seq_len) {
            Some(tail) if tail.iter().all(|t| (0x80..=0xBF).contains(t)) => {
                valid += 1;
                i += seq_len;
            }
            _ => {
                invalid += 1;
                i += 1;
            }
        }
    }

    if !has_high_bytes || valid > invalid * 2 {
        DetectedEncoding::Utf8
    } else {
        DetectedEncoding::Windows1252
    }
}

/// Decode statement bytes to text, returning the text and the encoding
/// used. Never fails: a wrong guess surfaces as mojibake in merchant
/// names, which downstream treats as data.
pub fn decode_statement(bytes: &[u8]) -> (String, DetectedEncoding) {
    let encoding = detect_encoding(bytes);
    let text = match encoding {
        DetectedEncoding::Utf8 => {
            let (decoded, _, _) = UTF_8.decode(bytes);
            decoded.into_owned()
        }
        DetectedEncoding::Windows1252 => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };
    (text, encoding)
}

/// Pick the column delimiter by counting candidates in the first line.
/// Defaults to comma when nothing matches.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = ',';
    let mut best_count = 0;
    for candidate in [';', ',', '\t'] {
        let count = first_line.matches(candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Detect the date format from a bounded sample of cell values.
///
/// Returns the first format under which more than 80% of the non-empty
/// samples parse to a valid calendar date, or None when no format
/// reaches the threshold.
pub fn detect_date_format(samples: &[&str]) -> Option<&'static str> {
    let non_empty: Vec<&str> = samples
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if non_empty.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        let parsed = non_empty
            .iter()
            .filter(|s| NaiveDate::parse_from_str(s, format).is_ok())
            .count();
        if parsed as f64 / non_empty.len() as f64 > 0.8 {
            return Some(format);
        }
    }
    None
}

/// Decide whether amount cells use ',' or '.' as the decimal separator.
/// Comma wins only when strictly more samples end in a comma-decimal
/// pattern than in a dot-decimal one.
pub fn detect_decimal_separator(samples: &[&str]) -> DecimalSeparator {
    let comma_re = Regex::new(r"\d+,\d{2}$").expect("valid regex");
    let dot_re = Regex::new(r"\d+\.\d{2}$").expect("valid regex");

    let comma = samples.iter().filter(|s| comma_re.is_match(s)).count();
    let dot = samples.iter().filter(|s| dot_re.is_match(s)).count();

    if comma > dot {
        DecimalSeparator::Comma
    } else {
        DecimalSeparator::Dot
    }
}

/// A parsed delimited statement: trimmed headers plus trimmed data rows
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse delimited text into headers and data rows.
///
/// Quoted fields follow RFC 4180: a doubled quote inside quotes is a
/// literal quote, and the delimiter does not split inside quotes.
/// Every field is trimmed. Ragged rows are kept as-is; empty and
/// whitespace-only lines are dropped. The first surviving line becomes
/// the header row.
pub fn parse_csv(content: &str, delimiter: char) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();

        // A single empty field is what a whitespace-only line parses to
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }

        if headers.is_empty() {
            headers = fields;
        } else {
            rows.push(fields);
        }
    }

    debug!(
        "Parsed {} data rows across {} columns",
        rows.len(),
        headers.len()
    );

    Ok(ParsedCsv { headers, rows })
}

/// Parse a statement amount cell into a signed number.
///
/// Keeps digits, separators and signs, drops everything else
/// (apostrophe grouping, currency suffixes). With a comma separator,
/// dots are thousands grouping; with a dot separator, commas are.
/// Returns 0.0 for empty or unparseable input — a missing amount is
/// "no amount", not an error.
pub fn parse_amount(value: &str, decimal_separator: DecimalSeparator) -> f64 {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();

    if kept.is_empty() {
        return 0.0;
    }

    let normalized = match decimal_separator {
        DecimalSeparator::Comma => kept.replace('.', "").replace(',', "."),
        DecimalSeparator::Dot => kept.replace(',', ""),
    };

    normalized.parse::<f64>().unwrap_or(0.0)
}

/// Parse a date cell, trying the preferred format first, then every
/// known candidate format.
pub fn parse_date(value: &str, preferred: Option<&str>) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(format) = preferred {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_encoding_plain_ascii() {
        assert_eq!(
            detect_encoding(b"Date;Description;Montant"),
            DetectedEncoding::Utf8
        );
    }

    #[test]
    fn test_detect_encoding_utf8_accents() {
        // "Géneve" with proper UTF-8 two-byte sequences
        let bytes = "Date;D\u{e9}bit;Cr\u{e9}dit;Gen\u{e8}ve".as_bytes();
        assert_eq!(detect_encoding(bytes), DetectedEncoding::Utf8);
    }

    #[test]
    fn test_detect_encoding_windows1252() {
        // 0xE9 is 'é' in Windows-1252 but a bare lead byte in UTF-8
        let bytes = b"Date;D\xe9bit;Cr\xe9dit";
        assert_eq!(detect_encoding(bytes), DetectedEncoding::Windows1252);
    }

    #[test]
    fn test_detect_encoding_bom_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Date;D\xe9bit");
        assert_eq!(detect_encoding(&bytes), DetectedEncoding::Utf8);
    }

    #[test]
    fn test_decode_windows1252_accents() {
        let (text, encoding) = decode_statement(b"Caf\xe9 du March\xe9;Gen\xe8ve");
        assert_eq!(encoding, DetectedEncoding::Windows1252);
        assert_eq!(text, "Café du Marché;Genève");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Date;Libellé".as_bytes());
        let (text, encoding) = decode_statement(&bytes);
        assert_eq!(encoding, DetectedEncoding::Utf8);
        assert!(text.starts_with("Date"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("Date;Débit;Crédit\n01.01.2024;10;"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("Date,Description,Amount"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("Date\tDescription\tAmount"), '\t');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter("no delimiters here"), ',');
    }

    #[test]
    fn test_detect_date_format_swiss_dots() {
        let samples = ["01.02.2024", "15.02.2024", "28.02.2024"];
        assert_eq!(detect_date_format(&samples), Some("%d.%m.%Y"));
    }

    #[test]
    fn test_detect_date_format_iso() {
        let samples = ["2024-01-15", "2024-02-01", "2024-03-20"];
        assert_eq!(detect_date_format(&samples), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_detect_date_format_day_first_wins_ambiguity() {
        // Every sample is valid under both slash layouts; day-first is
        // earlier in the candidate list
        let samples = ["01/02/2024", "05/03/2024"];
        assert_eq!(detect_date_format(&samples), Some("%d/%m/%Y"));
    }

    #[test]
    fn test_detect_date_format_us_when_day_first_fails() {
        // Month 13 does not exist, so day-first parsing falls below the
        // threshold and the US layout wins
        let samples = ["12/25/2024", "12/26/2024", "01/31/2024"];
        assert_eq!(detect_date_format(&samples), Some("%m/%d/%Y"));
    }

    #[test]
    fn test_detect_date_format_ignores_empty_samples() {
        let samples = ["01.02.2024", "", "  ", "15.02.2024"];
        assert_eq!(detect_date_format(&samples), Some("%d.%m.%Y"));
    }

    #[test]
    fn test_detect_date_format_none_for_garbage() {
        let samples = ["hello", "world", "01.02.2024"];
        assert_eq!(detect_date_format(&samples), None);
    }

    #[test]
    fn test_detect_decimal_separator_comma() {
        let samples = ["12,50", "1300,00", "4,95"];
        assert_eq!(detect_decimal_separator(&samples), DecimalSeparator::Comma);
    }

    #[test]
    fn test_detect_decimal_separator_dot() {
        let samples = ["12.50", "1300.00"];
        assert_eq!(detect_decimal_separator(&samples), DecimalSeparator::Dot);
    }

    #[test]
    fn test_detect_decimal_separator_tie_is_dot() {
        let samples = ["12,50", "13.00"];
        assert_eq!(detect_decimal_separator(&samples), DecimalSeparator::Dot);
    }

    #[test]
    fn test_parse_csv_basic() {
        let content = "Date;Libellé;Montant\n01.01.2024;MIGROS LAUSANNE;-42.50\n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Libellé", "Montant"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0][1], "MIGROS LAUSANNE");
    }

    #[test]
    fn test_parse_csv_quoted_delimiter() {
        let content = "Date;Libellé;Montant\n01.01.2024;\"COOP; PRONTO\";-10.00\n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.rows[0][1], "COOP; PRONTO");
    }

    #[test]
    fn test_parse_csv_doubled_quote() {
        let content = "A,B\n\"say \"\"hi\"\"\",x\n";
        let parsed = parse_csv(content, ',').unwrap();
        assert_eq!(parsed.rows[0][0], "say \"hi\"");
    }

    #[test]
    fn test_parse_csv_skips_blank_and_whitespace_lines() {
        let content = "Date;Montant\n\n   \n01.01.2024;-5.00\n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Montant"]);
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_parse_csv_keeps_delimited_empty_row() {
        // ";;" is a real (if useless) row, not a blank line
        let content = "A;B;C\n;;\n1;2;3\n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.rows[0].iter().all(|f| f.is_empty()));
    }

    #[test]
    fn test_parse_csv_tolerates_ragged_rows() {
        let content = "A;B;C\n1;2\n1;2;3;4\n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.rows[0].len(), 2);
        assert_eq!(parsed.rows[1].len(), 4);
    }

    #[test]
    fn test_parse_csv_trims_fields() {
        let content = "Date ; Libellé \n 01.01.2024 ;  MIGROS  \n";
        let parsed = parse_csv(content, ';').unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Libellé"]);
        assert_eq!(parsed.rows[0][0], "01.01.2024");
        assert_eq!(parsed.rows[0][1], "MIGROS");
    }

    #[test]
    fn test_parse_amount_plain() {
        assert_eq!(parse_amount("123.45", DecimalSeparator::Dot), 123.45);
        assert_eq!(parse_amount("-123.45", DecimalSeparator::Dot), -123.45);
        assert_eq!(parse_amount("+50.00", DecimalSeparator::Dot), 50.0);
    }

    #[test]
    fn test_parse_amount_swiss_apostrophes() {
        assert_eq!(parse_amount("1'234.50", DecimalSeparator::Dot), 1234.50);
        assert_eq!(parse_amount("12'345'678.90", DecimalSeparator::Dot), 12_345_678.90);
    }

    #[test]
    fn test_parse_amount_comma_decimal() {
        assert_eq!(parse_amount("1234,50", DecimalSeparator::Comma), 1234.50);
        // Dots are thousands grouping in comma mode
        assert_eq!(parse_amount("1.234,50", DecimalSeparator::Comma), 1234.50);
    }

    #[test]
    fn test_parse_amount_dot_mode_drops_commas() {
        assert_eq!(parse_amount("1,234.50", DecimalSeparator::Dot), 1234.50);
    }

    #[test]
    fn test_parse_amount_currency_noise() {
        assert_eq!(parse_amount("CHF 89.90", DecimalSeparator::Dot), 89.90);
        assert_eq!(parse_amount(" 42.00 CHF ", DecimalSeparator::Dot), 42.0);
    }

    #[test]
    fn test_parse_amount_empty_and_garbage() {
        assert_eq!(parse_amount("", DecimalSeparator::Dot), 0.0);
        assert_eq!(parse_amount("   ", DecimalSeparator::Dot), 0.0);
        assert_eq!(parse_amount("n/a", DecimalSeparator::Dot), 0.0);
        assert_eq!(parse_amount("--", DecimalSeparator::Dot), 0.0);
    }

    #[test]
    fn test_parse_date_preferred_format_first() {
        // Ambiguous cell: preferred format decides
        let date = parse_date("03/04/2024", Some("%m/%d/%Y")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let date = parse_date("03/04/2024", None).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    }

    #[test]
    fn test_parse_date_fallback_chain() {
        // Preferred format fails, candidates still rescue the cell
        let date = parse_date("2024-06-30", Some("%d.%m.%Y")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn test_parse_date_empty_and_invalid() {
        assert!(parse_date("", None).is_none());
        assert!(parse_date("  ", None).is_none());
        assert!(parse_date("31.02.2024", None).is_none());
        assert!(parse_date("not a date", None).is_none());
    }
}
