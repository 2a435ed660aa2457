//! Text utilities shared by the resolver and normalizer.

/// Normalizes text for comparison by lowercasing and replacing separators
/// with spaces.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-cases a raw value: uppercases the first alphabetic character of
/// each whitespace-separated word, leaving the rest untouched so acronyms
/// and already-canonical values survive a second pass unchanged.
#[must_use]
pub fn title_case(raw: &str) -> String {
    raw.trim()
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
