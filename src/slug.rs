//! URL-safe identifiers derived from post titles.
//!
//! The rules are literal:
//!
//! 1. lowercase the input
//! 2. every run of whitespace becomes a single `-`
//! 3. anything that is not an ASCII word character (`a-z`, `0-9`, `_`) or `-`
//!    is dropped
//! 4. runs of `-` collapse to one, leading and trailing `-` are trimmed
//!
//! Non-ASCII letters are dropped, not transliterated: `"Crème Brûlée"` becomes
//! `"crme-brle"`. An input made only of symbols yields an empty slug; callers
//! decide what an empty slug means (see [`crate::entry::parse_entry`]).

/// Derive a slug from arbitrary text. Total and deterministic.
///
/// ```
/// use blog_index::slug::derive_slug;
///
/// assert_eq!(derive_slug("Hello World"), "hello-world");
/// assert_eq!(derive_slug("  Crème Brûlée!! "), "crme-brle");
/// assert_eq!(derive_slug("!!!"), "");
/// ```
pub fn derive_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    let mut in_whitespace = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !in_whitespace {
                pending_hyphen = true;
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
        // Anything else is stripped without breaking a pending hyphen run.
    }

    slug
}
