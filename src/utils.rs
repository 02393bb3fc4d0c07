//! Utility functions

/// Sanitize a source/manga/chapter identifier for use as a single path
/// component.
///
/// Identifiers from scraping sources are often URL paths (e.g.
/// "/chapters/123-10001000/one-piece-chapter-1"), so separators and any other
/// non-portable characters are replaced with underscores. Staging and artifact
/// paths stay derivable from job identifiers for cleanup tooling.
pub(crate) fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
