//! Codec for multi-valued CSV fields.
//!
//! Synonyms, categories, curies and publications arrive as one string joined
//! with `ǂ` (U+01C2, LATIN LETTER ALVEOLAR CLICK). The character does not
//! occur in biomedical text, so no escaping is needed.

/// Reserved separator for multi-valued fields.
pub const MULTI_VALUE_SEPARATOR: char = '\u{01C2}';

/// Split a joined field into its ordered elements.
///
/// An empty field decodes to an empty sequence. Empty elements produced by
/// doubled or trailing separators are dropped.
pub fn split_multi(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field
        .split(MULTI_VALUE_SEPARATOR)
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split and drop repeated elements, keeping first-occurrence order.
pub fn split_multi_set(field: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    split_multi(field)
        .into_iter()
        .filter(|element| seen.insert(element.clone()))
        .collect()
}

/// Join elements with the reserved separator.
pub fn join_multi<S: AsRef<str>>(elements: &[S]) -> String {
    let mut joined = String::new();
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            joined.push(MULTI_VALUE_SEPARATOR);
        }
        joined.push_str(element.as_ref());
    }
    joined
}
