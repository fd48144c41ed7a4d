//! Similarity scoring between normalized strings.
//!
//! Two flavors: character-sequence similarity for addresses and token-set
//! similarity for business names. Both are pure functions.

use std::collections::HashSet;

use crate::models::{AddressComparison, NameComparison, RegistryRecord};
use crate::normalize::{normalize_address, normalize_name};

/// Address similarity at or above this score counts as a match.
pub const ADDRESS_MATCH_THRESHOLD: f64 = 80.0;
/// Name similarity at or above this ratio counts as a match.
pub const NAME_MATCH_THRESHOLD: f64 = 0.8;
/// Below this address score, word-level differences are reported.
const DIFFERENCE_REPORT_THRESHOLD: f64 = 90.0;

/// Character-sequence similarity between two strings, 0-100.
///
/// Twice the total length of matching blocks found by a greedy
/// longest-common-substring alignment, over the combined length.
/// Symmetric; 0 when either input is empty.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Argument order must not affect the score; the block alignment breaks
    // ties positionally, so compare in a canonical order.
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let x: Vec<char> = first.chars().collect();
    let y: Vec<char> = second.chars().collect();

    let matched = matching_len(&x, &y);
    200.0 * matched as f64 / (x.len() + y.len()) as f64
}

/// Total length of matching blocks: take the longest common substring,
/// then recurse on the unmatched slices to either side.
fn matching_len(a: &[char], b: &[char]) -> usize {
    let (a_start, b_start, size) = longest_match(a, b);
    if size == 0 {
        return 0;
    }

    size + matching_len(&a[..a_start], &b[..b_start])
        + matching_len(&a[a_start + size..], &b[b_start + size..])
}

/// Longest common substring of `a` and `b` as (start in a, start in b, len).
/// Earliest occurrence wins ties.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = prev[j] + 1;
                current[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        prev = current;
    }

    best
}

/// Jaccard index over the whitespace-delimited token sets of two strings,
/// 0-1. Symmetric; 0 when either token set is empty.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Compares a provided address against a reference address.
pub fn compare_addresses(provided: &str, reference: &str) -> AddressComparison {
    if provided.is_empty() || reference.is_empty() {
        return AddressComparison {
            provided_address: provided.to_string(),
            reference_address: reference.to_string(),
            similarity_score: 0.0,
            is_match: false,
            differences: vec!["One or both addresses are missing".to_string()],
        };
    }

    let norm_provided = normalize_address(provided);
    let norm_reference = normalize_address(reference);

    let similarity = sequence_ratio(&norm_provided, &norm_reference);

    let mut differences = Vec::new();
    if similarity < DIFFERENCE_REPORT_THRESHOLD {
        let provided_words: HashSet<&str> = norm_provided.split_whitespace().collect();
        let reference_words: HashSet<&str> = norm_reference.split_whitespace().collect();

        let mut only_in_provided: Vec<&str> =
            provided_words.difference(&reference_words).copied().collect();
        let mut only_in_reference: Vec<&str> =
            reference_words.difference(&provided_words).copied().collect();
        only_in_provided.sort_unstable();
        only_in_reference.sort_unstable();

        if !only_in_provided.is_empty() {
            differences.push(format!("Only in provided: {}", only_in_provided.join(", ")));
        }
        if !only_in_reference.is_empty() {
            differences.push(format!(
                "Only in reference: {}",
                only_in_reference.join(", ")
            ));
        }
    }

    AddressComparison {
        provided_address: provided.to_string(),
        reference_address: reference.to_string(),
        similarity_score: similarity,
        is_match: similarity >= ADDRESS_MATCH_THRESHOLD,
        differences,
    }
}

/// Compares a merchant name against the registry's legal and trade names.
pub fn compare_names(merchant_name: &str, record: &RegistryRecord) -> NameComparison {
    let merchant_normalized = normalize_name(merchant_name);
    let company_normalized = normalize_name(&record.company_name);
    let trade_normalized = normalize_name(record.trade_name.as_deref().unwrap_or(""));

    let company_similarity = token_set_ratio(&merchant_normalized, &company_normalized);
    let trade_similarity = token_set_ratio(&merchant_normalized, &trade_normalized);

    // On an exact tie the trade name wins; storefront names track the
    // fantasy name far more often than the legal one.
    let (best_match, best_match_name) = if company_similarity > trade_similarity {
        (
            Some("company_name".to_string()),
            Some(record.company_name.clone()),
        )
    } else if trade_similarity > 0.0 {
        (Some("trade_name".to_string()), record.trade_name.clone())
    } else {
        (None, None)
    };

    NameComparison {
        company_name_match: company_similarity >= NAME_MATCH_THRESHOLD,
        trade_name_match: trade_similarity >= NAME_MATCH_THRESHOLD,
        company_name_similarity: company_similarity,
        trade_name_similarity: trade_similarity,
        similarity_score: company_similarity.max(trade_similarity),
        best_match,
        best_match_name,
    }
}
