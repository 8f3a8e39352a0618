//! URL slugs derived from display names

/// Lowercase the name and collapse each whitespace run into a single `-`
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
