//! Parsing one content unit into a validated [`Entry`].
//!
//! A unit becomes an entry only if its frontmatter carries a non-empty
//! `title`, `publishedAt`, `author` and `summary`. Anything less is a
//! [`Rejected`] diagnostic: recoverable, reported, and never fatal to the
//! rest of the batch.
//!
//! ## Accepted keys
//!
//! | Field | Keys (first non-empty wins) |
//! |-------|-----------------------------|
//! | title | `title` |
//! | publishedAt | `publishedAt`, `published_at`, `date` |
//! | author | `author` |
//! | summary | `summary`, `excerpt`, `description` |
//!
//! `draft: true` is carried through so the collection builder can skip it.

use crate::frontmatter;
use crate::naming::parse_source_name;
use crate::slug::derive_slug;
use crate::types::{ContentUnit, Entry, IndexEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

const TITLE_KEYS: &[&str] = &["title"];
const PUBLISHED_KEYS: &[&str] = &["publishedAt", "published_at", "date"];
const AUTHOR_KEYS: &[&str] = &["author"];
const SUMMARY_KEYS: &[&str] = &["summary", "excerpt", "description"];

/// Every required field, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "publishedAt", "author", "summary"];

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// A unit that could not become an [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejected {
    pub source_name: String,
    /// Required fields that were absent or empty.
    pub missing_fields: Vec<String>,
    /// Fields that were present but unusable (an unparseable date, a title
    /// and file name that both slugify to nothing).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_fields: Vec<String>,
    /// Why the file or its frontmatter block could not be read, if it couldn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Rejected {
    /// Nothing could be read, so every required field counts as missing.
    pub fn unreadable(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            missing_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            invalid_fields: Vec::new(),
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_name)?;
        if !self.missing_fields.is_empty() {
            write!(f, ": missing {}", self.missing_fields.join(", "))?;
        }
        if !self.invalid_fields.is_empty() {
            write!(f, ": invalid {}", self.invalid_fields.join(", "))?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Parse and validate one content unit.
pub fn parse_entry(unit: &ContentUnit) -> Result<Entry, Rejected> {
    let (metadata, body) = frontmatter::split(&unit.raw_text)
        .map_err(|err| Rejected::unreadable(&unit.source_name, err.to_string()))?;

    let mut missing = Vec::new();
    let mut require = |keys: &[&str], name: &str| {
        metadata.text(keys).unwrap_or_else(|| {
            missing.push(name.to_string());
            String::new()
        })
    };
    let title = require(TITLE_KEYS, "title");
    let published_at = require(PUBLISHED_KEYS, "publishedAt");
    let author = require(AUTHOR_KEYS, "author");
    let summary = require(SUMMARY_KEYS, "summary");

    let source = parse_source_name(&unit.source_name);
    let mut invalid = Vec::new();

    if !published_at.is_empty() && parse_date(&published_at).is_none() {
        invalid.push("publishedAt".to_string());
    }

    let mut slug = derive_slug(&title);
    if slug.is_empty() {
        slug = derive_slug(&source.stem);
    }
    if !title.is_empty() && slug.is_empty() {
        invalid.push("slug".to_string());
    }

    if !missing.is_empty() || !invalid.is_empty() {
        return Err(Rejected {
            source_name: unit.source_name.clone(),
            missing_fields: missing,
            invalid_fields: invalid,
            detail: None,
        });
    }

    Ok(Entry {
        meta: IndexEntry {
            id: source.identifier,
            slug,
            title,
            published_at,
            author,
            summary,
            source_name: unit.source_name.clone(),
            draft: metadata.flag("draft"),
        },
        body: normalize_body(body),
    })
}

/// Normalize a post body.
///
/// Strips `<!-- -->` comments, trailing whitespace on every line, collapses
/// three or more consecutive newlines to two, and trims the whole text.
/// Idempotent: `normalize_body(&normalize_body(x)) == normalize_body(x)`.
pub fn normalize_body(body: &str) -> String {
    // Repeat until stable: removing one comment can expose another, as in
    // `<!<!-- a -->-- b -->`.
    let mut text = body.to_string();
    loop {
        let stripped = HTML_COMMENT.replace_all(&text, "").into_owned();
        if stripped.len() == text.len() {
            break;
        }
        text = stripped;
    }

    let trimmed_lines = text.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n");
    BLANK_LINE_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// Parse a frontmatter date into a UTC timestamp.
///
/// Accepts RFC 3339 (any offset, normalized to UTC), `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` and
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
