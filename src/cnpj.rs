//! CNPJ (Brazilian company tax identifier) extraction and format validation.
//!
//! Only the 14-digit format is checked; verification digits are left to the
//! registry, which rejects invalid identifiers on lookup.

use regex::Regex;

/// Strips everything but digits from a CNPJ candidate.
pub fn clean(cnpj: &str) -> String {
    cnpj.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True iff the digit-stripped identifier is exactly 14 digits.
pub fn is_valid_format(cnpj: &str) -> bool {
    clean(cnpj).len() == 14
}

/// Scans free text for a CNPJ in the canonical grouped format
/// (XX.XXX.XXX/XXXX-XX, separators optional) and returns the first
/// candidate as a bare 14-digit string.
pub fn extract_from_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let pattern = Regex::new(r"\b\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}\b").unwrap();
    for candidate in pattern.find_iter(text) {
        let cleaned = clean(candidate.as_str());
        if cleaned.len() == 14 {
            return Some(cleaned);
        }
    }

    None
}
