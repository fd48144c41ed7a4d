//! Text canonicalization for address and business-name comparison.
//!
//! Callers must treat an empty normalized string as "no data", never as a
//! degenerate match.

/// Whole-word address abbreviations expanded during normalization.
const ADDRESS_EXPANSIONS: [(&str, &str); 12] = [
    ("st", "street"),
    ("ave", "avenue"),
    ("rd", "road"),
    ("dr", "drive"),
    ("blvd", "boulevard"),
    ("apt", "apartment"),
    ("ste", "suite"),
    ("fl", "floor"),
    ("n", "north"),
    ("s", "south"),
    ("e", "east"),
    ("w", "west"),
];

/// Canonicalizes an address for comparison.
///
/// Lower-cases, strips punctuation to whitespace, expands whole-word
/// abbreviations, collapses whitespace runs and trims. Idempotent.
pub fn normalize_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }

    let lowered = address.to_lowercase();
    strip_punctuation(&lowered)
        .split_whitespace()
        .map(expand_abbreviation)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalizes a business name for comparison.
///
/// Like [`normalize_address`] but folds Latin diacritics (registry names
/// are accented Portuguese, directory names often are not) and performs no
/// abbreviation expansion.
pub fn normalize_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let folded: String = name.to_lowercase().chars().map(fold_diacritic).collect();
    strip_punctuation(&folded)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn expand_abbreviation(token: &str) -> &str {
    ADDRESS_EXPANSIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, full)| *full)
        .unwrap_or(token)
}

// Covers the Latin-1 range plus the Portuguese characters the registry
// actually emits; anything else passes through unchanged.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_address_abbreviations() {
        assert_eq!(normalize_address("123 Main St"), "123 main street");
        assert_eq!(normalize_address("456 Oak Ave"), "456 oak avenue");
        assert_eq!(
            normalize_address("789 N Elm Blvd, Apt 2"),
            "789 north elm boulevard apartment 2"
        );
    }

    #[test]
    fn abbreviations_only_expand_as_whole_words() {
        // "st" inside a word must not expand
        assert_eq!(normalize_address("Staten Island"), "staten island");
        assert_eq!(normalize_address("Austin Rd"), "austin road");
    }

    #[test]
    fn strips_punctuation_and_collapses_whitespace() {
        assert_eq!(
            normalize_address("  123,   Main   St.  "),
            "123 main street"
        );
        assert_eq!(normalize_address("one-two/three"), "one two three");
    }

    #[test]
    fn empty_input_normalizes_to_empty() {
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn address_normalization_is_idempotent() {
        let samples = [
            "123 Main St, Apt 4B",
            "Av. Paulista, 1578 - Bela Vista",
            "  456 W   Oak   Dr.  ",
        ];
        for sample in samples {
            let once = normalize_address(sample);
            assert_eq!(normalize_address(&once), once, "not idempotent: {}", sample);
        }
    }

    #[test]
    fn name_normalization_folds_diacritics() {
        assert_eq!(
            normalize_name("Padaria São João Ltda."),
            "padaria sao joao ltda"
        );
        assert_eq!(normalize_name("Açaí & Cia"), "acai cia");
    }
}
