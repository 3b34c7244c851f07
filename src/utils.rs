//! Token normalization helpers shared by the category model and feedback parsing.

use std::collections::BTreeSet;

/// Trim and lowercase a token for case-insensitive comparison.
pub fn normalize_token<T: AsRef<str>>(text: T) -> String {
    text.as_ref().trim().to_lowercase()
}

/// Split a multi-value cell on `delimiter` into a set of normalized, non-empty tokens.
pub fn split_tokens(text: &str, delimiter: char) -> BTreeSet<String> {
    text.split(delimiter)
        .map(normalize_token)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Canonical key used to match category configuration entries against category names.
///
/// Lowercases and treats spaces, hyphens, and underscores as equivalent, so
/// `release_year`, `Release Year`, and `release-year` resolve to the same key.
pub fn category_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if ch == ' ' || ch == '_' || ch == '-' {
            pending_separator = !key.is_empty();
            continue;
        }
        if pending_separator {
            key.push('_');
            pending_separator = false;
        }
        key.extend(ch.to_lowercase());
    }
    key
}

/// Keep only the first `chars` characters of `value`.
pub fn truncate_chars(value: &str, chars: usize) -> String {
    value.chars().take(chars).collect()
}

/// Leading run of ASCII digits in `value` (after trimming), or `"0"` when there is none.
///
/// `01. Romance Dawn` yields `01`; `Prologue` yields `0`.
pub fn numeric_prefix(value: &str) -> &str {
    let trimmed = value.trim_start();
    let end = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if end == 0 { "0" } else { &trimmed[..end] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tokens_trims_and_drops_empty_entries() {
        let tokens = split_tokens(" Fire,Flying , ,", ',');
        assert_eq!(
            tokens.into_iter().collect::<Vec<_>>(),
            vec!["fire".to_string(), "flying".to_string()]
        );
        assert!(split_tokens("", ',').is_empty());
    }

    #[test]
    fn category_key_collapses_separators() {
        assert_eq!(category_key("Release Year"), "release_year");
        assert_eq!(category_key("release_year"), "release_year");
        assert_eq!(category_key(" release--year "), "release_year");
        assert_eq!(category_key("Gender"), "gender");
    }

    #[test]
    fn truncate_chars_keeps_prefix() {
        assert_eq!(truncate_chars("2019-06-11", 4), "2019");
        assert_eq!(truncate_chars("20", 4), "20");
    }

    #[test]
    fn numeric_prefix_reads_leading_digits() {
        assert_eq!(numeric_prefix("01. Romance Dawn"), "01");
        assert_eq!(numeric_prefix(" 32. Wano Country"), "32");
        assert_eq!(numeric_prefix("120"), "120");
        assert_eq!(numeric_prefix("Prologue"), "0");
        assert_eq!(numeric_prefix(""), "0");
    }
}
