//! Display-name canonicalization for case/punctuation-insensitive comparison.

/// Per-character lowercase. Context-free, so applying it twice is a no-op.
pub fn lowercase(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}

/// Lowercase, strip everything but word characters and whitespace, collapse
/// whitespace runs, trim.
pub fn normalize(name: &str) -> String {
    let stripped: String = lowercase(name)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `normalize` over an optional name; absent input gives an empty string.
pub fn normalize_opt(name: Option<&str>) -> String {
    name.map(normalize).unwrap_or_default()
}
