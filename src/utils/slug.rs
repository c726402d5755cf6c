// src/utils/slug.rs

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Derives a display slug from a category name.
///
/// NFD-normalizes and drops combining marks (so "Lógica" and "Logica" slug
/// identically), collapses every non-alphanumeric run into a single hyphen,
/// and trims edge hyphens.
pub fn slugify(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    let lowered = stripped.to_lowercase();
    let hyphenated = non_alnum().replace_all(&lowered, "-");

    hyphenated.trim_matches('-').to_string()
}
