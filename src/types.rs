//! Shared types passed between pipeline stages.
//!
//! [`IndexEntry`] and [`Index`] are serialized to `index.json` and read back
//! by the lookup side, so their serde field names are the on-disk format:
//!
//! ```json
//! {
//!   "generatedAt": "2024-05-01T12:00:00Z",
//!   "slugOrder": ["newest-post", "older-post"],
//!   "entries": [
//!     { "id": "newest-post", "slug": "newest-post", "title": "Newest post",
//!       "date": "2024-04-30", "author": "Ada", "excerpt": "...",
//!       "sourceName": "newest-post.md" }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw content file as handed over by a [`crate::scan::ContentSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    /// Path relative to the content root, `/`-separated.
    pub source_name: String,
    /// Frontmatter plus body, unparsed.
    pub raw_text: String,
}

impl ContentUnit {
    pub fn new(source_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Everything about a post except its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Stable key derived from the source name. See [`crate::naming`].
    pub id: String,
    /// URL-safe key derived from the title. See [`crate::slug`].
    pub slug: String,
    pub title: String,
    /// Publication date as written in the frontmatter.
    #[serde(rename = "date")]
    pub published_at: String,
    pub author: String,
    #[serde(rename = "excerpt")]
    pub summary: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
}

/// A parsed, validated post.
///
/// Serializes flat: the metadata fields followed by `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(flatten)]
    pub meta: IndexEntry,
    pub body: String,
}

impl Entry {
    pub fn slug(&self) -> &str {
        &self.meta.slug
    }

    /// Split into metadata and body.
    pub fn into_parts(self) -> (IndexEntry, String) {
        (self.meta, self.body)
    }
}

/// Metadata-only view of the collection, newest first.
///
/// Built once per build and never mutated afterwards; a rebuild produces a
/// new `Index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub generated_at: DateTime<Utc>,
    /// Slugs in the same order as `entries`.
    pub slug_order: Vec<String>,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    /// First entry carrying `slug`, in index order.
    pub fn get(&self, slug: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single body keyed by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub slug: String,
    pub body: String,
}

/// Post bodies keyed by slug, one record per collection entry.
///
/// Records keep collection order. When slugs collide, [`PayloadStore::get`]
/// resolves to the first record, which matches the index entry that
/// [`Index::get`] returns for the same slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadStore {
    payloads: Vec<Payload>,
}

impl PayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slug: String, body: String) {
        self.payloads.push(Payload { slug, body });
    }

    pub fn get(&self, slug: &str) -> Option<&str> {
        self.payloads
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| p.body.as_str())
    }

    /// Slugs in record order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.payloads.iter().map(|p| p.slug.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Payload> {
        self.payloads.iter()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::index_entry;

    #[test]
    fn index_entry_uses_wire_field_names() {
        let entry = index_entry("hello", "2024-01-05");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["id"], "hello");
        assert_eq!(json["slug"], "hello");
        assert_eq!(json["date"], "2024-01-05");
        assert_eq!(json["excerpt"], "Summary of hello");
        assert_eq!(json["sourceName"], "hello.md");
        assert!(json.get("publishedAt").is_none());
        assert!(json.get("draft").is_none(), "draft=false is omitted");
    }

    #[test]
    fn entry_serializes_flat_with_body() {
        let entry = Entry {
            meta: index_entry("hello", "2024-01-05"),
            body: "Body text".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["slug"], "hello");
        assert_eq!(json["body"], "Body text");

        let back: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn index_uses_camel_case_top_level_keys() {
        let index = Index {
            generated_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            slug_order: vec!["hello".into()],
            entries: vec![index_entry("hello", "2024-01-05")],
        };
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["generatedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["slugOrder"][0], "hello");
        assert_eq!(json["entries"][0]["title"], "Post hello");
    }

    #[test]
    fn payload_store_get_returns_first_match() {
        let mut store = PayloadStore::new();
        store.push("dup".into(), "newer".into());
        store.push("dup".into(), "older".into());
        store.push("solo".into(), "only".into());

        assert_eq!(store.get("dup"), Some("newer"));
        assert_eq!(store.get("solo"), Some("only"));
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["dup", "dup", "solo"]);
        assert_eq!(store.len(), 3);
    }
}
