//! Identifier derivation from content source names.
//!
//! A source name is the path of a content file relative to the content root,
//! always with `/` separators (the enumerator normalizes Windows paths). The
//! identifier is that path without its extension, so it stays stable when a
//! post is retitled:
//!
//! - `hello-world.md` → `hello-world`
//! - `notes/2024/recap.mdx` → `notes/2024/recap`
//! - `notes/bundle/index.md` → `notes/bundle` (a directory post)
//!
//! The stem (last component of the identifier) is the slug fallback for
//! posts whose title slugifies to nothing.

/// Result of parsing a source name like `notes/2024/recap.mdx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// Extension-less relative path, `/`-separated.
    pub identifier: String,
    /// Last path component of `identifier`.
    pub stem: String,
}

/// File stem that marks a directory post.
const BUNDLE_STEM: &str = "index";

/// Parse a source name into its identifier and stem.
///
/// Never fails. An empty source name gives an empty identifier and stem.
pub fn parse_source_name(source_name: &str) -> ParsedSource {
    let normalized = source_name.replace('\\', "/");
    let trimmed = normalized.trim_matches('/');

    let (dir, file) = match trimmed.rfind('/') {
        Some(pos) => (Some(&trimmed[..pos]), &trimmed[pos + 1..]),
        None => (None, trimmed),
    };

    // Dotfiles like `.draft` have no extension to strip.
    let file_stem = match file.rfind('.') {
        Some(pos) if pos > 0 => &file[..pos],
        _ => file,
    };

    let identifier = match dir {
        Some(dir) if file_stem == BUNDLE_STEM => dir.to_string(),
        Some(dir) => format!("{dir}/{file_stem}"),
        None => file_stem.to_string(),
    };

    let stem = identifier
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    ParsedSource { identifier, stem }
}
