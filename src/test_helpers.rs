//! Shared test utilities for the blog-index test suite.
//!
//! Provides content-unit builders, a temp content tree writer, and lookup
//! helpers that panic with the available choices on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = write_content_tree(&[
//!     ("hello.md", &post_text("Hello", "2024-01-05", "Body")),
//! ]);
//! let units = DirectorySource::new(tmp.path()).units().unwrap();
//! let built = build_collection(units, &CollectionConfig::default());
//!
//! assert_eq!(collection_titles(&built.collection), vec!["Hello"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::collection::Collection;
use crate::types::{ContentUnit, Entry, IndexEntry};

// =========================================================================
// Unit builders
// =========================================================================

/// Raw text for a complete post: author `Ada`, summary `About {title}`.
pub fn post_text(title: &str, date: &str, body: &str) -> String {
    format!(
        "---\ntitle: {title:?}\npublishedAt: {date:?}\nauthor: Ada\nsummary: {summary:?}\n---\n{body}",
        summary = format!("About {title}"),
    )
}

/// A complete post unit. See [`post_text`].
pub fn post_unit(source_name: &str, title: &str, date: &str, body: &str) -> ContentUnit {
    ContentUnit::new(source_name, post_text(title, date, body))
}

/// A unit with hand-written frontmatter lines.
pub fn unit_with_frontmatter(source_name: &str, frontmatter: &str, body: &str) -> ContentUnit {
    ContentUnit::new(source_name, format!("---\n{frontmatter}\n---\n{body}"))
}

/// Index metadata for `slug` without going through the parser.
pub fn index_entry(slug: &str, date: &str) -> IndexEntry {
    IndexEntry {
        id: slug.to_string(),
        slug: slug.to_string(),
        title: format!("Post {slug}"),
        published_at: date.to_string(),
        author: "Ada".to_string(),
        summary: format!("Summary of {slug}"),
        source_name: format!("{slug}.md"),
        draft: false,
    }
}

/// A full entry for `slug` with the given body.
pub fn entry(slug: &str, date: &str, body: &str) -> Entry {
    Entry {
        meta: index_entry(slug, date),
        body: body.to_string(),
    }
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Write `(relative path, contents)` pairs under a fresh temp directory.
pub fn write_content_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, contents) in files {
        write_file(tmp.path(), relative, contents);
    }
    tmp
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// =========================================================================
// Collection lookups (panic with the available choices on a miss)
// =========================================================================

/// Find an entry by source name. Panics if not found.
pub fn find_entry<'a>(collection: &'a Collection, source_name: &str) -> &'a Entry {
    collection
        .entries
        .iter()
        .find(|e| e.meta.source_name == source_name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = collection
                .entries
                .iter()
                .map(|e| e.meta.source_name.as_str())
                .collect();
            panic!("entry '{source_name}' not found. Available: {names:?}")
        })
}

/// All titles in collection order.
pub fn collection_titles(collection: &Collection) -> Vec<&str> {
    collection
        .entries
        .iter()
        .map(|e| e.meta.title.as_str())
        .collect()
}

/// All slugs in collection order.
pub fn collection_slugs(collection: &Collection) -> Vec<&str> {
    collection.entries.iter().map(|e| e.slug()).collect()
}
