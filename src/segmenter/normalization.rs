// Index keys: case and punctuation insensitive, whitespace preserved inside
// the segment so `a  b` and `a b` stay distinct.

use crate::redactor::MARKER;

/// Keys shorter than this (in characters) are noise and never indexed
pub const MIN_KEY_CHARS: usize = 3;

/// Lower-case and drop ASCII punctuation, keeping `_` so emphasis markup
/// such as `snake_case` survives.
pub fn normalize_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    normalize_key_into(text, &mut key);
    key
}

/// Normalize into a supplied buffer
pub fn normalize_key_into(text: &str, buffer: &mut String) {
    buffer.clear();
    for ch in text.chars() {
        if ch.is_ascii_punctuation() && ch != '_' {
            continue;
        }
        buffer.extend(ch.to_lowercase());
    }

    let trimmed = buffer.trim();
    if trimmed.len() != buffer.len() {
        let trimmed_content = trimmed.to_string();
        buffer.clear();
        buffer.push_str(&trimmed_content);
    }
}

/// True for segments that carry nothing but earlier redaction markers
pub fn is_marker_only(literal: &str) -> bool {
    literal.replace(MARKER, "").trim().is_empty()
}

/// Key for a literal, or `None` when it must stay out of the index
pub fn index_key(literal: &str) -> Option<String> {
    if is_marker_only(literal) {
        return None;
    }
    let key = normalize_key(&literal.replace(MARKER, " "));
    (key.chars().count() >= MIN_KEY_CHARS).then_some(key)
}
