use ammonia;

/// Sanitizes free-text catalog fields (descriptions, characteristics,
/// career lists) before they are stored.
///
/// Whitelist-based: safe inline tags survive, <script>/<iframe> and event
/// attributes are stripped. These fields are rendered verbatim by the
/// frontend result screens, so this is the fail-safe against stored XSS.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input)
}

/// Trims and sanitizes an optional field, mapping empty input to None.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input
        .map(|s| clean_text(s.trim()))
        .filter(|s| !s.is_empty())
}
