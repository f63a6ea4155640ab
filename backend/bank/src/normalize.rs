use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}]+").expect("separator pattern is valid"));

/// Combining diacritical mark blocks. Other combining marks (Indic vowel signs,
/// Thai vowels, Arabic harakat) spell the word and are kept.
fn is_diacritic(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

/// Comparison form of an answer: lowercase, no diacritics, punctuation and
/// whitespace runs collapsed to one space, trimmed.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .collect();

    SEPARATORS.replace_all(&folded, " ").trim().to_string()
}

pub fn answers_match(submitted: &str, expected: &str) -> bool {
    let submitted = normalize(submitted);

    !submitted.is_empty() && submitted == normalize(expected)
}
